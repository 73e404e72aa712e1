//! Static NSE reference data: sector/industry for well-known symbols and
//! the NIFTY 50 constituents. Used to override provider sectors and as the
//! metadata fallback when providers are unreachable.

use super::quote::normalize_symbol;

/// (symbol, sector, industry)
const NSE_SECTORS: &[(&str, &str, &str)] = &[
    // IT
    ("TCS", "Information Technology", "IT Services & Consulting"),
    ("INFY", "Information Technology", "IT Services & Consulting"),
    ("WIPRO", "Information Technology", "IT Services & Consulting"),
    ("HCLTECH", "Information Technology", "IT Services & Consulting"),
    ("TECHM", "Information Technology", "IT Services & Consulting"),
    ("LTI", "Information Technology", "IT Services & Consulting"),
    // Banking
    ("HDFCBANK", "Financial Services", "Private Banks"),
    ("ICICIBANK", "Financial Services", "Private Banks"),
    ("KOTAKBANK", "Financial Services", "Private Banks"),
    ("AXISBANK", "Financial Services", "Private Banks"),
    ("INDUSINDBK", "Financial Services", "Private Banks"),
    ("SBIN", "Financial Services", "Public Banks"),
    ("PNB", "Financial Services", "Public Banks"),
    ("BANKBARODA", "Financial Services", "Public Banks"),
    // NBFC
    ("BAJFINANCE", "Financial Services", "NBFCs"),
    ("BAJAJFINSV", "Financial Services", "NBFCs"),
    ("CHOLAFIN", "Financial Services", "NBFCs"),
    // Auto
    ("MARUTI", "Automobile", "Passenger Vehicles"),
    ("TATAMOTORS", "Automobile", "Passenger Vehicles"),
    ("M&M", "Automobile", "Passenger Vehicles"),
    ("EICHERMOT", "Automobile", "Two Wheelers"),
    ("HEROMOTOCO", "Automobile", "Two Wheelers"),
    ("BAJAJ-AUTO", "Automobile", "Two Wheelers"),
    // Pharma
    ("SUNPHARMA", "Pharmaceuticals", "Generic Drugs"),
    ("DRREDDY", "Pharmaceuticals", "Generic Drugs"),
    ("CIPLA", "Pharmaceuticals", "Generic Drugs"),
    ("DIVISLAB", "Pharmaceuticals", "Generic Drugs"),
    ("AUROPHARMA", "Pharmaceuticals", "Generic Drugs"),
    // FMCG
    ("HINDUNILVR", "FMCG", "Personal Care"),
    ("ITC", "FMCG", "Diversified FMCG"),
    ("NESTLEIND", "FMCG", "Packaged Foods"),
    ("BRITANNIA", "FMCG", "Packaged Foods"),
    ("DABUR", "FMCG", "Personal Care"),
    // Telecom
    ("BHARTIARTL", "Telecom", "Telecom Services"),
    ("IDEA", "Telecom", "Telecom Services"),
    // Energy
    ("RELIANCE", "Energy", "Refineries"),
    ("ONGC", "Energy", "Oil & Gas Exploration"),
    ("BPCL", "Energy", "Refineries"),
    ("IOC", "Energy", "Refineries"),
    // Metals
    ("TATASTEEL", "Metals & Mining", "Steel"),
    ("HINDALCO", "Metals & Mining", "Aluminium"),
    ("JSWSTEEL", "Metals & Mining", "Steel"),
    ("VEDL", "Metals & Mining", "Diversified Metals"),
    ("COALINDIA", "Metals & Mining", "Coal"),
    // Cement
    ("ULTRACEMCO", "Construction Materials", "Cement"),
    ("GRASIM", "Construction Materials", "Cement"),
    ("SHREECEM", "Construction Materials", "Cement"),
    // Consumer Durables
    ("TITAN", "Consumer Durables", "Gems & Jewellery"),
    ("ASIANPAINT", "Consumer Durables", "Paints"),
    // ETFs
    ("NIFTYBEES", "ETF", "Index ETF"),
    ("GOLDBEES", "ETF", "Commodity ETF"),
    ("BANKBEES", "ETF", "Sectoral ETF"),
    ("JUNIORBEES", "ETF", "Index ETF"),
];

const NIFTY_50: &[&str] = &[
    "ADANIENT", "ADANIPORTS", "APOLLOHOSP", "ASIANPAINT", "AXISBANK", "BAJAJ-AUTO",
    "BAJFINANCE", "BAJAJFINSV", "BHARTIARTL", "BPCL", "BRITANNIA", "CIPLA",
    "COALINDIA", "DIVISLAB", "DRREDDY", "EICHERMOT", "GRASIM", "HCLTECH",
    "HDFCBANK", "HDFCLIFE", "HEROMOTOCO", "HINDALCO", "HINDUNILVR", "ICICIBANK",
    "INDUSINDBK", "INFY", "ITC", "JSWSTEEL", "KOTAKBANK", "LT", "M&M", "MARUTI",
    "NESTLEIND", "NTPC", "ONGC", "POWERGRID", "RELIANCE", "SBIN", "SHREECEM",
    "SUNPHARMA", "TATAMOTORS", "TATASTEEL", "TCS", "TECHM", "TITAN", "ULTRACEMCO",
    "UPL", "WIPRO",
];

/// Sector used when nothing better is known.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Sector and industry for an NSE symbol (`.NS` suffix and case ignored).
pub fn nse_sector(symbol: &str) -> Option<(&'static str, &'static str)> {
    let symbol = normalize_symbol(symbol);
    NSE_SECTORS
        .iter()
        .find(|(sym, _, _)| *sym == symbol)
        .map(|(_, sector, industry)| (*sector, *industry))
}

/// Whether a symbol is a NIFTY 50 constituent.
pub fn is_nifty50(symbol: &str) -> bool {
    NIFTY_50.contains(&normalize_symbol(symbol).as_str())
}
