//! Per-method, per-position decision whether a string argument is sent to the
//! backend as a JSON literal or as a plain string.

use clientapi::BridgeError;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Positional arguments of wallet RPC methods that take non-string values.
const STANDARD_ENTRIES: &[(&str, usize)] = &[
    ("setmocktime", 0),
    ("generate", 0),
    ("generate", 1),
    ("generatetoaddress", 0),
    ("generatetoaddress", 2),
    ("getnetworkhashps", 0),
    ("getnetworkhashps", 1),
    ("sendtoaddress", 1),
    ("sendtoaddress", 4),
    ("settxfee", 0),
    ("getreceivedbyaddress", 1),
    ("getreceivedbyaccount", 1),
    ("listreceivedbyaddress", 0),
    ("listreceivedbyaddress", 1),
    ("listreceivedbyaddress", 2),
    ("listreceivedbyaccount", 0),
    ("listreceivedbyaccount", 1),
    ("listreceivedbyaccount", 2),
    ("getbalance", 1),
    ("getbalance", 2),
    ("getblockhash", 0),
    ("move", 2),
    ("move", 3),
    ("sendfrom", 2),
    ("sendfrom", 3),
    ("listtransactions", 1),
    ("listtransactions", 2),
    ("listtransactions", 3),
    ("listaccounts", 0),
    ("listaccounts", 1),
    ("walletpassphrase", 1),
    ("getblocktemplate", 0),
    ("listsinceblock", 1),
    ("listsinceblock", 2),
    ("sendmany", 1),
    ("sendmany", 2),
    ("sendmany", 4),
    ("addmultisigaddress", 0),
    ("addmultisigaddress", 1),
    ("createmultisig", 0),
    ("createmultisig", 1),
    ("listunspent", 0),
    ("listunspent", 1),
    ("listunspent", 2),
    ("getblock", 1),
    ("getblockheader", 1),
    ("gettransaction", 1),
    ("getrawtransaction", 1),
    ("createrawtransaction", 0),
    ("createrawtransaction", 1),
    ("createrawtransaction", 2),
    ("signrawtransaction", 1),
    ("signrawtransaction", 2),
    ("sendrawtransaction", 1),
    ("fundrawtransaction", 1),
    ("gettxout", 1),
    ("gettxout", 2),
    ("gettxoutproof", 0),
    ("lockunspent", 0),
    ("lockunspent", 1),
    ("importprivkey", 2),
    ("importaddress", 2),
    ("importaddress", 3),
    ("importpubkey", 2),
    ("importmulti", 0),
    ("importmulti", 1),
    ("verifychain", 0),
    ("verifychain", 1),
    ("keypoolrefill", 0),
    ("getrawmempool", 0),
    ("estimatefee", 0),
    ("estimatepriority", 0),
    ("estimatesmartfee", 0),
    ("estimatesmartpriority", 0),
    ("prioritisetransaction", 1),
    ("prioritisetransaction", 2),
    ("setban", 2),
    ("setban", 3),
    ("getmempoolancestors", 1),
    ("getmempooldescendants", 1),
    ("setnetworkactive", 0),
];

/// Immutable set of `(method, position)` pairs whose argument is parsed as
/// JSON before being sent. Everything else is sent as a string.
#[derive(Debug, Clone, Default)]
pub struct ConvertTable {
    members: HashMap<String, HashSet<usize>>,
}

impl ConvertTable {
    /// Table for the wallet node's built-in RPC methods.
    pub fn standard() -> Self {
        Self::from_entries(STANDARD_ENTRIES.iter().copied())
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, usize)>) -> Self {
        let mut members: HashMap<String, HashSet<usize>> = HashMap::new();
        for (method, idx) in entries {
            members.entry(method.to_string()).or_default().insert(idx);
        }
        Self { members }
    }

    /// Whether the argument at `idx` of `method` is a JSON literal.
    pub fn is_structured(&self, method: &str, idx: usize) -> bool {
        self.members
            .get(method)
            .is_some_and(|positions| positions.contains(&idx))
    }

    /// Convert one argument.
    pub fn convert(&self, method: &str, idx: usize, raw: &str) -> Result<Value, BridgeError> {
        if !self.is_structured(method, idx) {
            return Ok(Value::String(raw.to_string()));
        }
        serde_json::from_str(raw)
            .map_err(|e| BridgeError::Parse(format!("error parsing JSON '{raw}': {e}")))
    }

    /// Convert a full argument list, position by position.
    pub fn convert_all(&self, method: &str, args: &[String]) -> Result<Vec<Value>, BridgeError> {
        args.iter()
            .enumerate()
            .map(|(idx, raw)| self.convert(method, idx, raw))
            .collect()
    }
}
