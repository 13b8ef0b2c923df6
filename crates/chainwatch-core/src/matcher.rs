//! The matcher — a pure function from `(NormalizedTx, subscription snapshot)`
//! to a set of deliveries. Does no I/O and never suspends.

use std::collections::HashSet;

use serde_json::json;

use crate::subscription::SubSnapshot;
use crate::types::{ConnectionId, EventKind, NormalizedTx};

/// `(tx.hash, subscribed_addr, tx.token)` — the dedup key. An event MUST be
/// delivered at most once per subscription per triple within one poller
/// cycle.
type DedupKey = (String, String, Option<String>);

fn addr_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Returns `true` if `tx` matches `subscribed_addr`/`tokens` per §4.4.
///
/// `derived_token_account`, when `Some`, lets chain-specific callers (Solana)
/// supply an address derived from `(subscribed_addr, token)` that also
/// counts as a match — the associated token account case.
fn interest_matches(
    tx: &NormalizedTx,
    subscribed_addr: &str,
    tokens: &[String],
    derived_token_account: Option<&str>,
) -> bool {
    let side_matches = |addr: &str| addr_eq(addr, subscribed_addr) || derived_token_account.is_some_and(|d| addr_eq(addr, d));

    let from_matches = tx.from.as_deref().is_some_and(side_matches);
    let to_matches = side_matches(&tx.to);

    match &tx.token {
        None => from_matches || to_matches,
        Some(token) => {
            let token_in_filter = tokens.iter().any(|t| addr_eq(t, token));
            token_in_filter && (from_matches || to_matches)
        }
    }
}

/// One matched delivery: the subscription that should receive it, and the
/// JSON payload to send.
pub struct Delivery {
    pub cid: ConnectionId,
    pub payload: serde_json::Value,
}

/// Build the wire payload for a match.
///
/// The wire key for the hash is `txid` for Tron/Solana-native and `hash`
/// otherwise; `value` is always serialized as a decimal string.
fn build_payload(tx: &NormalizedTx, subscribed_addr: &str, use_txid_key: bool) -> serde_json::Value {
    let hash_key = if use_txid_key { "txid" } else { "hash" };
    let mut tx_json = json!({
        "height": tx.block_number,
        hash_key: tx.hash,
        "from": tx.from,
        "to": tx.to,
        "value": tx.value.to_string(),
    });
    let obj = tx_json.as_object_mut().unwrap();
    if let Some(symbol) = &tx.symbol {
        obj.insert("symbol".into(), json!(symbol));
    }
    if let Some(fee) = &tx.fee {
        obj.insert("fee".into(), json!(fee.to_string()));
    }
    if let Some(receipt) = &tx.receipt {
        obj.insert("receipt".into(), json!(receipt));
    }

    json!({
        "error": false,
        "event": EventKind::SubscribeAccount.to_string(),
        "data": {
            "addr": subscribed_addr,
            "token": tx.token,
            "tx": tx_json,
        }
    })
}

/// Match `tx` against a snapshot of live subscriptions and return the
/// deliveries to make. `use_txid_key` selects the wire key for the hash
/// field (Tron/Solana-native use `txid`, everything else uses `hash`).
/// `derive_token_account` lets Solana supply the associated-token-account
/// comparison described in §4.4; other chains pass a no-op.
pub fn match_tx(
    tx: &NormalizedTx,
    subs: &[SubSnapshot],
    use_txid_key: bool,
    derive_token_account: impl Fn(&str, &str) -> Option<String>,
) -> Vec<Delivery> {
    if tx.is_zero_value() {
        return vec![];
    }

    let mut deliveries = Vec::new();

    for sub in subs {
        let mut seen: HashSet<DedupKey> = HashSet::new();

        for interest in &sub.interests {
            let derived = tx
                .token
                .as_deref()
                .and_then(|token| derive_token_account(&interest.address, token));

            if !interest_matches(tx, &interest.address, &interest.tokens, derived.as_deref()) {
                continue;
            }

            let key: DedupKey = (tx.hash.clone(), interest.address.clone(), tx.token.clone());
            if !seen.insert(key) {
                continue;
            }

            let payload = build_payload(tx, &interest.address, use_txid_key);
            sub.send.send(payload.clone());
            deliveries.push(Delivery { cid: sub.cid, payload });
        }
    }

    deliveries
}
