use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;

use serde::{Deserialize, Serialize};

use crate::errors::*;

/// One configured chain: symbolic name plus the LCD base url to query.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Endpoint {
    pub symbol: String,
    pub base_url: String,
}

impl Endpoint {
    pub fn new(symbol: &str, base_url: &str) -> Endpoint {
        Endpoint {
            symbol: symbol.to_string(),
            base_url: base_url.to_string(),
        }
    }
}

pub fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new("IRISTEST", "https://iristest-api.bravo.komodo.earth/"),
        Endpoint::new("NUCLEUSTEST", "https://nucleus-api.alpha.komodo.earth/"),
        Endpoint::new("ATOM", "https://cosmos-api.alpha.komodo.earth/"),
        Endpoint::new("OSMO", "https://osmosis-api.alpha.komodo.earth/"),
        Endpoint::new("IRIS", "https://iris-rest.publicnode.com/"),
    ]
}

/// Read an endpoint table from a JSON file of the form
/// `{"SYMBOL": "https://base-url/", ...}`.
pub fn load_endpoints(path: &str) -> Result<Vec<Endpoint>> {
    let reader = BufReader::new(File::open(path)?);
    let table: BTreeMap<String, String> = serde_json::from_reader(reader)?;
    Ok(table
        .into_iter()
        .map(|(symbol, base_url)| Endpoint { symbol, base_url })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_table_has_all_configured_chains() {
        let endpoints = default_endpoints();
        assert_eq!(endpoints.len(), 5);
        let symbols: Vec<&str> = endpoints.iter().map(|e| e.symbol.as_str()).collect();
        assert!(symbols.contains(&"ATOM"));
        assert!(symbols.contains(&"OSMO"));
        assert!(endpoints.iter().all(|e| e.base_url.starts_with("https://")));
    }

    #[test]
    fn load_endpoints_reads_symbol_to_url_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"JUNO": "https://juno.test/", "AKT": "https://akash.test"}}"#
        )
        .unwrap();

        let endpoints = load_endpoints(file.path().to_str().unwrap()).unwrap();
        assert_eq!(endpoints.len(), 2);
        // BTreeMap, so the table comes back sorted by symbol
        assert_eq!(endpoints[0].symbol, "AKT");
        assert_eq!(endpoints[0].base_url, "https://akash.test");
        assert_eq!(endpoints[1].symbol, "JUNO");
    }

    #[test]
    fn load_endpoints_fails_on_missing_file() {
        assert!(load_endpoints("/nonexistent/endpoints.json").is_err());
    }
}
