//! Tracked Instrument Catalog
//!
//! The symbol universes, value bands, and text pools the synthetic
//! fetchers draw from. Bands are calibrated so generated values sit in a
//! plausible range for each instrument.

/// Value band for one equity index.
#[derive(Debug, Clone, Copy)]
pub struct IndexProfile {
    /// Index symbol.
    pub symbol: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Lower bound of the generated level.
    pub low: f64,
    /// Upper bound of the generated level.
    pub high: f64,
}

/// Tracked market indices.
pub const MARKET_INDICES: &[IndexProfile] = &[
    IndexProfile { symbol: "^AXJO", name: "ASX 200", low: 7400.0, high: 7500.0 },
    IndexProfile { symbol: "^AORD", name: "All Ordinaries", low: 7600.0, high: 7700.0 },
    IndexProfile { symbol: "^GSPC", name: "S&P 500", low: 4800.0, high: 4900.0 },
    IndexProfile { symbol: "^DJI", name: "Dow Jones", low: 38000.0, high: 39000.0 },
    IndexProfile { symbol: "^IXIC", name: "NASDAQ", low: 15000.0, high: 15500.0 },
    IndexProfile { symbol: "^HSI", name: "Hang Seng", low: 18000.0, high: 19000.0 },
    IndexProfile { symbol: "^N225", name: "Nikkei 225", low: 38000.0, high: 39000.0 },
    IndexProfile { symbol: "^FTSE", name: "FTSE 100", low: 7800.0, high: 7900.0 },
];

/// Rate band for one currency pair.
#[derive(Debug, Clone, Copy)]
pub struct PairProfile {
    /// Pair in `BASE/QUOTE` form.
    pub pair: &'static str,
    /// Lower bound of the generated rate.
    pub low: f64,
    /// Upper bound of the generated rate.
    pub high: f64,
}

/// Tracked currency pairs.
pub const FOREX_PAIRS: &[PairProfile] = &[
    PairProfile { pair: "AUD/USD", low: 0.65, high: 0.70 },
    PairProfile { pair: "AUD/CNY", low: 4.3, high: 4.5 },
    PairProfile { pair: "USD/CNY", low: 6.4, high: 6.6 },
    PairProfile { pair: "AUD/JPY", low: 100.0, high: 105.0 },
    PairProfile { pair: "AUD/EUR", low: 0.60, high: 0.65 },
];

/// Seed band for a pair, for stream ticks arriving before any fetch.
#[must_use]
pub fn pair_seed_band(pair: &str) -> (f64, f64) {
    FOREX_PAIRS
        .iter()
        .find(|profile| profile.pair == pair)
        .map_or((0.5, 1.5), |profile| (profile.low, profile.high))
}

/// Tracked ASX stocks, grouped by sector.
pub const ASX_STOCKS: &[&str] = &[
    "BHP.AX", "RIO.AX", "FMG.AX", "MIN.AX", "S32.AX", // Materials
    "TWE.AX", "A2M.AX", "WES.AX", "WOW.AX", "COL.AX", // Consumer Staples
    "CSL.AX", "RMD.AX", "COH.AX", // Healthcare
    "CBA.AX", "NAB.AX", "WBC.AX", "ANZ.AX", "MQG.AX", // Financials
    "WTC.AX", "XRO.AX", "APX.AX", "ALU.AX", // Information Technology
    "TCL.AX", "SYD.AX", "QAN.AX", // Industrials
    "AGL.AX", "ORG.AX", // Utilities
    "WPL.AX", "STO.AX", // Energy
];

/// Display name for a tracked stock.
#[must_use]
pub fn stock_name(symbol: &str) -> Option<&'static str> {
    let name = match symbol {
        "BHP.AX" => "BHP Group",
        "RIO.AX" => "Rio Tinto",
        "FMG.AX" => "Fortescue Metals",
        "MIN.AX" => "Mineral Resources",
        "S32.AX" => "South32",
        "TWE.AX" => "Treasury Wine Estates",
        "A2M.AX" => "A2 Milk",
        "WES.AX" => "Wesfarmers",
        "WOW.AX" => "Woolworths Group",
        "COL.AX" => "Coles Group",
        "CSL.AX" => "CSL Limited",
        "RMD.AX" => "ResMed",
        "COH.AX" => "Cochlear",
        "CBA.AX" => "Commonwealth Bank",
        "NAB.AX" => "National Australia Bank",
        "WBC.AX" => "Westpac Banking",
        "ANZ.AX" => "ANZ Group",
        "MQG.AX" => "Macquarie Group",
        "WTC.AX" => "WiseTech Global",
        "XRO.AX" => "Xero",
        "APX.AX" => "Appen",
        "ALU.AX" => "Altium",
        "TCL.AX" => "Transurban Group",
        "SYD.AX" => "Sydney Airport",
        "QAN.AX" => "Qantas Airways",
        "AGL.AX" => "AGL Energy",
        "ORG.AX" => "Origin Energy",
        "WPL.AX" => "Woodside Energy",
        "STO.AX" => "Santos",
        _ => return None,
    };
    Some(name)
}

/// Seed price band for a stock, by sector tier.
#[must_use]
pub fn stock_seed_band(symbol: &str) -> (f64, f64) {
    match symbol {
        "BHP.AX" | "RIO.AX" => (40.0, 50.0),
        "CBA.AX" | "NAB.AX" | "WBC.AX" | "ANZ.AX" => (25.0, 35.0),
        "CSL.AX" => (250.0, 270.0),
        _ => (5.0, 100.0),
    }
}

/// Headline pool for generated tariff news.
pub const NEWS_HEADLINES: &[&str] = &[
    "Trump Announces New Tariffs on Chinese Imports",
    "Australian Exporters Brace for Impact of US Tariffs",
    "China Threatens Retaliation Against US Tariff Measures",
    "ASX Drops as Tariff Tensions Escalate",
    "Treasury Wine Estates Shares Plummet on Tariff News",
    "Mining Stocks Rally Despite Tariff Concerns",
    "Economists Warn of Global Slowdown Due to Trade War",
    "Australian Dollar Falls on Tariff Announcement",
    "US-China Trade Talks Stall Amid Tariff Disputes",
    "BHP Expects Limited Impact from New Tariff Regime",
];

/// Source pool for generated tariff news.
pub const NEWS_SOURCES: &[&str] = &[
    "Bloomberg",
    "Reuters",
    "CNBC",
    "Financial Times",
    "Wall Street Journal",
];

/// Value and previous-reading bands for one indicator.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorProfile {
    /// Indicator name.
    pub name: &'static str,
    /// Band for the current value.
    pub value: (f64, f64),
    /// Band for the prior reading.
    pub previous: (f64, f64),
}

/// Indicator bands for one country.
#[derive(Debug, Clone, Copy)]
pub struct CountryProfile {
    /// Country name.
    pub country: &'static str,
    /// The country's indicators.
    pub indicators: &'static [IndicatorProfile],
}

/// Tracked economies and their indicator bands.
pub const ECONOMIC_INDICATORS: &[CountryProfile] = &[
    CountryProfile {
        country: "US",
        indicators: &[
            IndicatorProfile { name: "GDP Growth", value: (1.8, 2.2), previous: (1.7, 2.1) },
            IndicatorProfile { name: "Inflation", value: (2.8, 3.2), previous: (2.9, 3.3) },
            IndicatorProfile { name: "Unemployment", value: (3.6, 3.9), previous: (3.7, 4.0) },
            IndicatorProfile { name: "Interest Rate", value: (4.4, 4.6), previous: (4.4, 4.6) },
        ],
    },
    CountryProfile {
        country: "Australia",
        indicators: &[
            IndicatorProfile { name: "GDP Growth", value: (1.6, 2.0), previous: (1.7, 2.1) },
            IndicatorProfile { name: "Inflation", value: (2.7, 3.1), previous: (2.9, 3.3) },
            IndicatorProfile { name: "Unemployment", value: (3.9, 4.3), previous: (3.8, 4.2) },
            IndicatorProfile { name: "Interest Rate", value: (3.65, 3.85), previous: (3.65, 3.85) },
        ],
    },
    CountryProfile {
        country: "China",
        indicators: &[
            IndicatorProfile { name: "GDP Growth", value: (5.0, 5.4), previous: (5.1, 5.5) },
            IndicatorProfile { name: "Inflation", value: (1.9, 2.3), previous: (1.8, 2.2) },
            IndicatorProfile { name: "Unemployment", value: (4.8, 5.2), previous: (4.9, 5.3) },
            IndicatorProfile { name: "Interest Rate", value: (3.35, 3.55), previous: (3.35, 3.55) },
        ],
    },
];

// =============================================================================
// Tests
// =============================================================================
