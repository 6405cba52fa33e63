//! Registry of national open-data portals that run CKAN.

use serde::Serialize;

/// A national CKAN portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Portal {
    /// Lowercase country code used on the command line (`us`, `uk`, ...)
    pub code: &'static str,
    /// Country name for display
    pub name: &'static str,
    /// Site root; the action API lives under `{base_url}/api/3`
    #[serde(skip)]
    pub base_url: &'static str,
}

impl Portal {
    /// Base path expected by [`crate::Configuration::base_path`].
    pub fn api_base(&self) -> String {
        api_base(self.base_url)
    }
}

/// Append the API v3 suffix to a portal site root.
pub fn api_base(site_root: &str) -> String {
    format!("{}/api/3", site_root.trim_end_matches('/'))
}

/// All supported portals, in the order the test harness visits them.
pub const PORTALS: &[Portal] = &[
    Portal {
        code: "us",
        name: "United States",
        base_url: "https://catalog.data.gov",
    },
    Portal {
        code: "uk",
        name: "United Kingdom",
        base_url: "https://data.gov.uk",
    },
    Portal {
        code: "au",
        name: "Australia",
        base_url: "https://data.gov.au/data",
    },
    Portal {
        code: "it",
        name: "Italy",
        base_url: "https://www.dati.gov.it/opendata",
    },
    Portal {
        code: "br",
        name: "Brazil",
        base_url: "https://dados.gov.br",
    },
    Portal {
        code: "lv",
        name: "Latvia",
        base_url: "https://data.gov.lv/dati",
    },
    Portal {
        code: "si",
        name: "Slovenia",
        base_url: "https://podatki.gov.si",
    },
    Portal {
        code: "uy",
        name: "Uruguay",
        base_url: "https://catalogodatos.gub.uy",
    },
];

/// Look up a portal by country code, case-insensitively.
pub fn find(code: &str) -> Option<&'static Portal> {
    PORTALS
        .iter()
        .find(|portal| portal.code.eq_ignore_ascii_case(code.trim()))
}

/// Country codes of every supported portal.
pub fn codes() -> Vec<&'static str> {
    PORTALS.iter().map(|portal| portal.code).collect()
}
