//! Shared fixtures for integration tests: tiny Cucumber report builders.

#![allow(dead_code)]

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

pub fn cap(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).expect("cap must be positive")
}

pub fn failing_step(keyword: &str, name: &str, error: &str) -> Value {
    json!({
        "keyword": keyword,
        "name": name,
        "result": { "status": "failed", "duration": 1_200_000, "error_message": error }
    })
}

pub fn passing_step(keyword: &str, name: &str) -> Value {
    json!({ "keyword": keyword, "name": name, "result": { "status": "passed" } })
}

pub fn scenario(name: &str, line: u64, steps: Vec<Value>) -> Value {
    json!({ "type": "scenario", "name": name, "line": line, "steps": steps })
}

pub fn feature(name: &str, uri: &str, scenarios: Vec<Value>) -> Value {
    json!({ "name": name, "uri": uri, "elements": scenarios })
}

pub fn write_json(dir: &Path, file_name: &str, value: &Value) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, serde_json::to_vec_pretty(value).expect("serialize fixture"))
        .expect("write fixture");
    path
}

pub fn write_text(dir: &Path, file_name: &str, text: &str) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, text).expect("write fixture");
    path
}
