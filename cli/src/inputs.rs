use std::path::Path;

use got_merkle::{parse_hash, Hash, ProofBundle};
use got_token::{parse_units, Address, Amount};

use crate::error::CliError;

/// Non-empty lines with `#` comments stripped.
fn content_lines(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents.lines().enumerate().filter_map(|(i, line)| {
        let line = line.split('#').next().unwrap_or_default().trim();
        (!line.is_empty()).then_some((i + 1, line))
    })
}

/// One address per line.
pub fn parse_members(contents: &str) -> Result<Vec<Address>, CliError> {
    content_lines(contents)
        .map(|(line_no, line)| {
            line.parse::<Address>()
                .map_err(|e| CliError::InvalidInput(format!("line {line_no}: {e}")))
        })
        .collect()
}

pub fn read_members(path: &Path) -> Result<Vec<Address>, CliError> {
    parse_members(&std::fs::read_to_string(path)?)
}

/// `address,amount` per line; amounts are decimal token strings.
pub fn parse_stakes(contents: &str, decimals: u8) -> Result<(Vec<Address>, Vec<Amount>), CliError> {
    let mut addresses = Vec::new();
    let mut amounts = Vec::new();
    for (line_no, line) in content_lines(contents) {
        let (address, amount) = line.split_once(',').ok_or_else(|| {
            CliError::InvalidInput(format!("line {line_no}: expected `address,amount`"))
        })?;
        let address = address
            .trim()
            .parse::<Address>()
            .map_err(|e| CliError::InvalidInput(format!("line {line_no}: {e}")))?;
        let amount = parse_units(amount.trim(), decimals)
            .map_err(|e| CliError::InvalidInput(format!("line {line_no}: {e}")))?;
        addresses.push(address);
        amounts.push(amount);
    }
    Ok((addresses, amounts))
}

/// Proof from a bundle file if given, otherwise from hex arguments.
pub fn resolve_proof(hashes: &[String], bundle: Option<&Path>) -> Result<Vec<Hash>, CliError> {
    if let Some(path) = bundle {
        let bundle: ProofBundle = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        return Ok(bundle.proof);
    }
    Ok(hashes
        .iter()
        .map(|h| parse_hash(h))
        .collect::<Result<Vec<_>, _>>()?)
}
