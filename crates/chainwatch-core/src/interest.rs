//! `ContractInterestSet` — the union of token contracts any live subscription
//! cares about, capped at 50 per chain.
//!
//! Entries are created on first subscribe and persist for process lifetime;
//! there is no reference counting. That's a deliberate simplification
//! consistent with the 50-entry cap (see Open Question (b) in `DESIGN.md`).

use std::sync::Mutex;

/// Maximum number of distinct token contracts tracked per chain.
pub const MAX_CONTRACT_INTERESTS: usize = 50;

#[derive(Default)]
pub struct ContractInterestSet {
    contracts: Mutex<Vec<String>>,
}

impl ContractInterestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `addr` as an interest. Returns `true` if this was a
    /// first-seen insert (the caller should then install an upstream
    /// filter), `false` if already present or if the cap was hit (in which
    /// case the insert is silently dropped — the caller should log it).
    pub fn insert(&self, addr: &str) -> bool {
        let mut contracts = self.contracts.lock().unwrap();
        if contracts.iter().any(|c| c == addr) {
            return false;
        }
        if contracts.len() >= MAX_CONTRACT_INTERESTS {
            tracing::warn!(addr, "contract interest set at capacity, dropping");
            return false;
        }
        contracts.push(addr.to_string());
        true
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.contracts.lock().unwrap().iter().any(|c| c == addr)
    }

    pub fn len(&self) -> usize {
        self.contracts.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_reports_first_seen() {
        let set = ContractInterestSet::new();
        assert!(set.insert("0xabc"));
        assert!(!set.insert("0xabc")); // already present
    }

    #[test]
    fn cap_enforced_silently() {
        let set = ContractInterestSet::new();
        for i in 0..MAX_CONTRACT_INTERESTS {
            assert!(set.insert(&format!("0x{i}")));
        }
        assert_eq!(set.len(), MAX_CONTRACT_INTERESTS);

        // 51st distinct token is a silent no-op.
        assert!(!set.insert("0xoverflow"));
        assert_eq!(set.len(), MAX_CONTRACT_INTERESTS);
        assert!(!set.contains("0xoverflow"));
    }
}
