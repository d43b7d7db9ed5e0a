//! Output column naming

use super::Metric;

/// Names and aliases of the two columns a run adds to the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    pub raw_name: String,
    pub raw_alias: String,
    pub std_name: String,
    pub std_alias: String,
}

impl OutputSchema {
    /// `<PREFIX>_<code>` and `Std_<PREFIX>_<code>`, aliased after the full
    /// source name.
    pub fn new(prefix: &str, source: &str, metric: Metric) -> Self {
        let code = metric.code();
        let raw_name = format!("{}_{}", prefix, code);
        let raw_alias = format!("{}_{}", source, code);
        Self {
            std_name: format!("Std_{}", raw_name),
            std_alias: format!("Std_{}", raw_alias),
            raw_name,
            raw_alias,
        }
    }

    /// Derive the prefix from `source`: its first three characters,
    /// uppercased
    pub fn from_source(source: &str, metric: Metric) -> Self {
        Self::new(&short_prefix(source), source, metric)
    }

    pub fn field_names(&self) -> [&str; 2] {
        [&self.raw_name, &self.std_name]
    }
}

pub(crate) fn short_prefix(source: &str) -> String {
    source.chars().take(3).collect::<String>().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_from_source() {
        let schema = OutputSchema::from_source("geology", Metric::PolygonCategoryCount);
        assert_eq!(schema.raw_name, "GEO_ANc");
        assert_eq!(schema.std_name, "Std_GEO_ANc");
        assert_eq!(schema.raw_alias, "geology_ANc");
        assert_eq!(schema.std_alias, "Std_geology_ANc");
    }

    #[test]
    fn test_short_source() {
        let schema = OutputSchema::from_source("dm", Metric::VerticalRelief);
        assert_eq!(schema.field_names(), ["DM_RM", "Std_DM_RM"]);
    }
}
