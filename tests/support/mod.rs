// ABOUTME: Shared test support: recording fake runtime and HTTP responders.
// ABOUTME: Each integration test pulls in what it needs.

#![allow(dead_code)]

pub mod fake_runtime;
pub mod http;
