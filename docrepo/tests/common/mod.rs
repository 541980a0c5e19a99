#![allow(dead_code)]

use docrepo::{bson::oid::ObjectId, prelude::*};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity)]
pub struct SampleEntity {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub rank: i32,
}

impl SampleEntity {
    pub fn named(name: &str) -> Self {
        Self { id: empty_id(), name: name.to_string(), rank: 0 }
    }

    pub fn ranked(name: &str, rank: i32) -> Self {
        Self { rank, ..Self::named(name) }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
