use serde_json::{json, Map, Value};
use std::fmt;

/// Read-only view over a mapping for notebook display.
///
/// Interactive front ends ask for `repr_json()` and render the data as a
/// collapsible tree; plain consoles get the pretty-printed JSON from
/// `Display`.
#[derive(Debug, Clone)]
pub struct ReprDict<'a> {
    data: &'a Map<String, Value>,
    rootname: String,
    expanded: bool,
}

impl<'a> ReprDict<'a> {
    pub fn new(data: &'a Map<String, Value>) -> Self {
        Self {
            data,
            rootname: "root".to_string(),
            expanded: false,
        }
    }

    pub fn rootname(mut self, rootname: impl Into<String>) -> Self {
        self.rootname = rootname.into();
        self
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    pub fn data(&self) -> &Map<String, Value> {
        self.data
    }

    /// Data and display metadata, in that order.
    pub fn repr_json(&self) -> (Value, Value) {
        (
            Value::Object(self.data.clone()),
            json!({ "expanded": self.expanded, "root": self.rootname }),
        )
    }
}

impl fmt::Display for ReprDict<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string_pretty(self.data).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Map<String, Value> {
        match json!({
            "ip": { "axi_gpio_0": { "phys_addr": 1092616192, "type": "xilinx.com:ip:axi_gpio:2.0" } },
            "clocks": [100.0, 50.0]
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_repr_json_metadata() {
        let map = sample();
        let (data, meta) = ReprDict::new(&map)
            .rootname("overlay")
            .expanded(true)
            .repr_json();
        assert_eq!(data["ip"]["axi_gpio_0"]["phys_addr"], 1092616192);
        assert_eq!(meta, json!({ "expanded": true, "root": "overlay" }));
    }

    #[test]
    fn test_defaults() {
        let map = sample();
        let (_, meta) = ReprDict::new(&map).repr_json();
        assert_eq!(meta, json!({ "expanded": false, "root": "root" }));
    }

    #[test]
    fn test_display_does_not_mutate() {
        let map = sample();
        let before = map.clone();
        let text = ReprDict::new(&map).to_string();
        assert!(text.contains("\"axi_gpio_0\""));
        assert!(text.contains('\n'));
        assert_eq!(map, before);
    }
}
