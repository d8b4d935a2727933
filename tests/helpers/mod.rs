#![allow(dead_code)]
pub mod mock_publisher;

use buildnotify::{BuildContext, BuildStatus, Room};
use std::collections::BTreeMap;

/// The single room most scenarios run against.
pub fn devops_rooms() -> Vec<Room> {
    vec![Room::new("devops", "R1", "T1")]
}

pub fn success_context() -> BuildContext {
    BuildContext {
        status: BuildStatus::Success,
        job_name: "build-1".to_string(),
        build_number: 42,
        job_url: "http://ci/build-1/42".to_string(),
        build_url: None,
        variables: BTreeMap::new(),
    }
}
