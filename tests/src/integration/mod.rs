//! # Integration Tests
//!
//! Issuer, completion queue, drain and recorder working together.

pub mod scenarios;
pub mod stress;
pub mod tcp_end_to_end;

/// Parse one latency log line into `(number, sent, received, delta, failed)`.
#[cfg(test)]
pub(crate) fn parse_line(line: &str) -> (i64, i64, i64, i64, bool) {
    let fields: Vec<&str> = line.split(' ').collect();
    assert!(fields.len() >= 4, "short latency line: {line:?}");
    let field = |i: usize| -> i64 {
        fields[i]
            .parse()
            .unwrap_or_else(|_| panic!("bad field {i} in {line:?}"))
    };
    (field(0), field(1), field(2), field(3), line.ends_with(" RPC failed"))
}
