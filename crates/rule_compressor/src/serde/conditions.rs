//! Custom serde for Vec<Condition> - each condition as its `"<variable> <op> <threshold>"` string

use crate::rules::Condition;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(conditions: &[Condition], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(conditions.iter().map(|c| c.to_string()))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    raw.iter()
        .map(|s| s.parse::<Condition>().map_err(D::Error::custom))
        .collect()
}
