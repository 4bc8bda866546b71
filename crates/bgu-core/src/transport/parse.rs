//! Parse response header lines collected by the transport.

use std::collections::HashMap;

/// Header map of the final response. Earlier blocks (`100 Continue`, redirects)
/// are discarded whenever a new status line starts. Repeated names are joined
/// with ", ".
pub fn parse_response_headers(lines: &[String]) -> HashMap<String, String> {
    let mut out: HashMap<String, String> = HashMap::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            out.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_string();
            let value = value.trim();
            out.entry(name)
                .and_modify(|v| {
                    v.push_str(", ");
                    v.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
    }
    out
}
