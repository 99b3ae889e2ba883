//! Fixed hand-formatted layout of the generated config files.
//!
//! One tab-indented `"key": value` line per field, the coordination endpoint
//! kept inline, and no newline after the closing brace. String values are
//! escaped through `serde_json`, so the output is always valid JSON.

use crate::config::{ComputeConfig, CoordinationConfig, Endpoint, ProviderConfig, ServiceConfig};

struct LayoutWriter {
    lines: Vec<String>,
}

impl LayoutWriter {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    fn raw(mut self, key: &str, value: String) -> Self {
        self.lines.push(format!("\t{}: {value}", quote(key)));
        self
    }

    fn string(self, key: &str, value: &str) -> Self {
        self.raw(key, quote(value))
    }

    fn number(self, key: &str, value: impl std::fmt::Display) -> Self {
        self.raw(key, value.to_string())
    }

    fn strings(self, key: &str, values: &[String]) -> Self {
        let items: Vec<String> = values.iter().map(|v| quote(v)).collect();
        self.raw(key, format!("[{}]", items.join(", ")))
    }

    fn endpoint(self, key: &str, endpoint: &Endpoint) -> Self {
        self.raw(
            key,
            format!(
                "{{ \"hostname\": {}, \"port\": {} }}",
                quote(&endpoint.hostname),
                endpoint.port
            ),
        )
    }

    fn finish(self) -> String {
        format!("{{\n{}\n}}", self.lines.join(",\n"))
    }
}

fn quote(s: &str) -> String {
    // Serializing a &str cannot fail.
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

pub(crate) fn render(config: &ServiceConfig) -> String {
    match config {
        ServiceConfig::Provider(c) => render_provider(c),
        ServiceConfig::Compute(c) => render_compute(c),
        ServiceConfig::Coordination(c) => render_coordination(c),
    }
}

fn render_provider(c: &ProviderConfig) -> String {
    LayoutWriter::new()
        .string("dpi_name", &c.dpi_name)
        .number("dpi_bind_port", c.dpi_bind_port)
        .string("allele_file", &c.allele_file)
        .endpoint("coordination_server_info", &c.coordination_server_info)
        .finish()
}

fn render_compute(c: &ComputeConfig) -> String {
    LayoutWriter::new()
        .number("enclave_node_bind_port", c.enclave_node_bind_port)
        .strings("covariants", &c.covariants)
        .strings("institutions", &c.institutions)
        .string("y_val_name", &c.y_val_name)
        .string("analysis_type", c.analysis_type.as_str())
        .string("enclave_path", &c.enclave_path)
        .endpoint("coordination_server_info", &c.coordination_server_info)
        .finish()
}

fn render_coordination(c: &CoordinationConfig) -> String {
    LayoutWriter::new()
        .number("coordination_server_bind_port", c.coordination_server_bind_port)
        .number("enclave_node_count", c.enclave_node_count)
        .number("dpi_count", c.dpi_count)
        .string("output_file_name", &c.output_file_name)
        .finish()
}
