//! Wire shapes a single court entry arrives in.
//! Variant order is the detection priority: serde tries each in turn.
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum CourtShape {
    Keyed { players: PlayerList },
    Teams { team1: TeamShape, team2: TeamShape },
    Flat([String; 4]),
    Nested([[String; 2]; 2]),
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum PlayerList {
    Flat([String; 4]),
    Nested([[String; 2]; 2]),
}

/// One team: either a 2-name array or a string such as "Ann & Bo".
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum TeamShape {
    Pair([String; 2]),
    Joined(String),
}
