//! The mint invoker: an ordered, strictly sequential probe over candidate mint entry
//! points.  The first confirmed candidate wins, an explicit user rejection ends the
//! invocation, anything else moves on to the next candidate.

use log::{debug, info, warn};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::abi::{format_address, Address};
use crate::calls::MintCandidate;
use crate::error::{AmountError, WalletError};
use crate::units::{format_ether, total_value};
use crate::wallet::{Receipt, TransactionRequest, WalletSigner};

/// the parameters of one purchase
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct MintRequest {
    /// address receiving the minted units
    pub buyer: Address,
    /// number of units, at least 1
    pub quantity: u32,
    /// payment attached to payable candidates, in wei
    pub total_value: U256,
}

impl MintRequest {
    /// Returns Result<MintRequest, AmountError>
    ///
    /// The payment is `price * quantity` when the unit price is known, otherwise the
    /// fixed `fallback` amount
    ///
    /// # Arguments
    ///
    /// * `buyer` - receiving address
    /// * `quantity` - number of units, zero is raised to 1
    /// * `price` - unit price in wei if known
    /// * `fallback` - payment used when the price is unknown
    pub fn new(
        buyer: Address,
        quantity: u32,
        price: Option<U256>,
        fallback: U256,
    ) -> Result<Self, AmountError> {
        let quantity = quantity.max(1);
        let total_value = match price {
            Some(p) => total_value(p, quantity)?,
            None => fallback,
        };
        Ok(MintRequest {
            buyer,
            quantity,
            total_value,
        })
    }
}

/// Returns u32 of a user entered quantity, defaulting to 1 for anything that is not a
/// positive integer
pub fn parse_quantity(input: &str) -> u32 {
    match input.trim().parse::<u32>() {
        Ok(q) if q >= 1 => q,
        _ => 1,
    }
}

/// where a single invocation currently is
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum MintPhase {
    Idle,
    Preparing,
    /// probing the candidate at this index
    Probing(usize),
    Confirmed,
    Rejected,
    Exhausted,
}

impl MintPhase {
    /// Returns true for the phases that end an invocation
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MintPhase::Confirmed | MintPhase::Rejected | MintPhase::Exhausted
        )
    }
}

/// how one candidate fared
#[derive(Clone, PartialEq, Debug)]
pub enum AttemptResult {
    /// mined successfully
    Confirmed(Receipt),
    /// the user declined to sign
    Rejected,
    /// the candidate does not apply to this contract
    Failed(WalletError),
}

/// one probed candidate
#[derive(Clone, PartialEq, Debug)]
pub struct MintAttempt {
    /// candidate that was tried
    pub candidate: MintCandidate,
    /// its result
    pub result: AttemptResult,
}

/// terminal result of an invocation
#[derive(Clone, PartialEq, Debug)]
pub enum MintOutcome {
    /// a candidate was confirmed on chain
    Confirmed {
        candidate: MintCandidate,
        receipt: Receipt,
    },
    /// the user declined the signing prompt for this candidate
    Rejected { candidate: MintCandidate },
    /// every candidate failed
    Exhausted,
}

/// everything that happened during one invocation
#[derive(Clone, PartialEq, Debug)]
pub struct MintReport {
    /// terminal result
    pub outcome: MintOutcome,
    /// attempts in the order they were made
    pub attempts: Vec<MintAttempt>,
}

impl MintReport {
    /// Returns true if a candidate was confirmed
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, MintOutcome::Confirmed { .. })
    }
}

/// probes candidate mint entry points of one contract
pub struct MintInvoker {
    contract: Address,
    candidates: Vec<MintCandidate>,
    phase: MintPhase,
}

impl MintInvoker {
    /// Returns a MintInvoker
    ///
    /// # Arguments
    ///
    /// * `contract` - contract to mint from
    /// * `candidates` - entry points in the order they are tried
    pub fn new(contract: Address, candidates: Vec<MintCandidate>) -> Self {
        MintInvoker {
            contract,
            candidates,
            phase: MintPhase::Idle,
        }
    }

    /// Returns the candidate list
    pub fn candidates(&self) -> &[MintCandidate] {
        &self.candidates
    }

    /// Returns the current phase
    pub fn phase(&self) -> MintPhase {
        self.phase
    }

    /// marks the start of an invocation, before the request is built
    pub fn prepare(&mut self) {
        self.phase = MintPhase::Preparing;
    }

    /// returns to Idle once the caller has handled a terminal outcome
    pub fn reset(&mut self) {
        self.phase = MintPhase::Idle;
    }

    /// Returns AttemptResult of submitting one candidate and waiting for it
    async fn attempt(
        &self,
        signer: &dyn WalletSigner,
        candidate: &MintCandidate,
        request: &MintRequest,
    ) -> AttemptResult {
        let tx = TransactionRequest {
            from: signer.address(),
            to: self.contract,
            value: candidate.value(request.total_value),
            data: candidate.calldata(request.buyer, request.quantity),
        };
        let hash = match signer.send_transaction(tx).await {
            Ok(hash) => hash,
            Err(e) if e.is_rejection() => return AttemptResult::Rejected,
            Err(e) => return AttemptResult::Failed(e),
        };
        debug!("{} submitted as {:?}", candidate.function.signature(), hash);
        match signer.wait_for_confirmation(hash).await {
            Ok(receipt) if receipt.success => AttemptResult::Confirmed(receipt),
            Ok(receipt) => AttemptResult::Failed(WalletError::TxReverted {
                message: format!("receipt for {:?} reports failure", receipt.transaction_hash),
            }),
            Err(e) if e.is_rejection() => AttemptResult::Rejected,
            Err(e) => AttemptResult::Failed(e),
        }
    }

    /// Returns MintReport from trying each candidate in order until one is confirmed,
    /// the user rejects, or the list runs out
    ///
    /// # Arguments
    ///
    /// * `signer` - authorized signing handle of the connected wallet
    /// * `request` - purchase parameters
    pub async fn invoke(&mut self, signer: &dyn WalletSigner, request: &MintRequest) -> MintReport {
        info!(
            "minting {} from {} for {} ETH",
            request.quantity,
            format_address(&self.contract),
            format_ether(request.total_value)
        );
        let mut attempts = Vec::with_capacity(self.candidates.len());
        for (idx, candidate) in self.candidates.iter().enumerate() {
            self.phase = MintPhase::Probing(idx);
            let result = self.attempt(signer, candidate, request).await;
            attempts.push(MintAttempt {
                candidate: *candidate,
                result: result.clone(),
            });
            match result {
                AttemptResult::Confirmed(receipt) => {
                    info!("mint confirmed via {}", candidate.function.signature());
                    self.phase = MintPhase::Confirmed;
                    return MintReport {
                        outcome: MintOutcome::Confirmed {
                            candidate: *candidate,
                            receipt,
                        },
                        attempts,
                    };
                }
                AttemptResult::Rejected => {
                    info!("user rejected {}", candidate.function.signature());
                    self.phase = MintPhase::Rejected;
                    return MintReport {
                        outcome: MintOutcome::Rejected {
                            candidate: *candidate,
                        },
                        attempts,
                    };
                }
                AttemptResult::Failed(e) => {
                    debug!("{} does not apply: {}", candidate.function.signature(), e);
                }
            }
        }
        warn!(
            "no matching mint function among {} candidates",
            self.candidates.len()
        );
        self.phase = MintPhase::Exhausted;
        MintReport {
            outcome: MintOutcome::Exhausted,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::{default_candidates, MintFunction};
    use crate::testing::{MockContract, MockSigner};
    use crate::units::parse_ether;

    fn buyer() -> Address {
        Address::repeat_byte(0xb0)
    }

    fn request(quantity: u32) -> MintRequest {
        MintRequest::new(buyer(), quantity, Some(U256::from(100)), U256::from(7)).unwrap()
    }

    #[test]
    fn test_request_value() {
        let price = parse_ether("0.0003").unwrap();
        let req = MintRequest::new(buyer(), 3, Some(price), U256::from(1)).unwrap();
        assert_eq!(req.total_value, parse_ether("0.0009").unwrap());
        // unknown price falls back to the fixed amount
        let fallback = parse_ether("0.0003").unwrap();
        let req = MintRequest::new(buyer(), 3, None, fallback).unwrap();
        assert_eq!(req.total_value, fallback);
        let req = MintRequest::new(buyer(), 0, Some(price), fallback).unwrap();
        assert_eq!(req.quantity, 1);
        assert!(MintRequest::new(buyer(), 2, Some(U256::MAX), fallback).is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3"), 3);
        assert_eq!(parse_quantity(" 12 "), 12);
        assert_eq!(parse_quantity("0"), 1);
        assert_eq!(parse_quantity("-2"), 1);
        assert_eq!(parse_quantity("1.5"), 1);
        assert_eq!(parse_quantity("abc"), 1);
        assert_eq!(parse_quantity(""), 1);
    }

    #[tokio::test]
    async fn test_first_success_after_k_failures() {
        let candidates = default_candidates(0);
        let n = candidates.len();
        for k in 0..n {
            let contract = MockContract::empty().with_mint_function(candidates[k].function);
            let signer = MockSigner::new(buyer(), contract.clone());
            let mut invoker = MintInvoker::new(contract.address(), candidates.clone());
            let report = invoker.invoke(&signer, &request(1)).await;
            assert!(report.is_success(), "candidate {} should succeed", k);
            assert_eq!(report.attempts.len(), k + 1);
            assert_eq!(signer.submissions().len(), k + 1);
            assert!(report.attempts[..k]
                .iter()
                .all(|a| matches!(a.result, AttemptResult::Failed(_))));
            match &report.outcome {
                MintOutcome::Confirmed { candidate, .. } => assert_eq!(*candidate, candidates[k]),
                other => panic!("unexpected outcome {:?}", other),
            }
            assert_eq!(invoker.phase(), MintPhase::Confirmed);
            assert_eq!(contract.minted(), 1);
        }
    }

    #[tokio::test]
    async fn test_rejection_stops_probing() {
        let candidates = default_candidates(0);
        for (pos, cand) in candidates.iter().enumerate() {
            // every later candidate would succeed, but must never be tried
            let mut contract = MockContract::empty();
            for later in &candidates[pos + 1..] {
                contract = contract.with_mint_function(later.function);
            }
            let signer = MockSigner::new(buyer(), contract.clone()).rejecting(cand.function);
            let mut invoker = MintInvoker::new(contract.address(), candidates.clone());
            let report = invoker.invoke(&signer, &request(2)).await;
            assert_eq!(
                report.outcome,
                MintOutcome::Rejected { candidate: *cand }
            );
            assert_eq!(report.attempts.len(), pos + 1);
            assert_eq!(report.attempts[pos].result, AttemptResult::Rejected);
            assert_eq!(signer.submissions().len(), pos + 1);
            assert_eq!(invoker.phase(), MintPhase::Rejected);
            assert_eq!(contract.minted(), 0);
        }
    }

    #[tokio::test]
    async fn test_exhaustion() {
        let candidates = default_candidates(0);
        let contract = MockContract::empty();
        let signer = MockSigner::new(buyer(), contract.clone());
        let mut invoker = MintInvoker::new(contract.address(), candidates.clone());
        let report = invoker.invoke(&signer, &request(1)).await;
        assert_eq!(report.outcome, MintOutcome::Exhausted);
        assert_eq!(report.attempts.len(), candidates.len());
        assert_eq!(signer.submissions().len(), candidates.len());
        assert_eq!(invoker.phase(), MintPhase::Exhausted);
        invoker.reset();
        assert_eq!(invoker.phase(), MintPhase::Idle);

        // an empty list is exhausted immediately
        let mut invoker = MintInvoker::new(contract.address(), Vec::new());
        let report = invoker.invoke(&signer, &request(1)).await;
        assert_eq!(report.outcome, MintOutcome::Exhausted);
        assert!(report.attempts.is_empty());
    }

    #[tokio::test]
    async fn test_reverted_receipt_moves_on() {
        let candidates = vec![
            MintCandidate::payable(MintFunction::MintTo),
            MintCandidate::payable(MintFunction::Claim),
        ];
        let contract = MockContract::empty()
            .with_mint_function(MintFunction::MintTo)
            .with_mint_function(MintFunction::Claim);
        let signer =
            MockSigner::new(buyer(), contract.clone()).reverting_on_chain(MintFunction::MintTo);
        let mut invoker = MintInvoker::new(contract.address(), candidates);
        let report = invoker.invoke(&signer, &request(1)).await;
        assert!(report.is_success());
        assert_eq!(report.attempts.len(), 2);
        assert!(matches!(
            report.attempts[0].result,
            AttemptResult::Failed(WalletError::TxReverted { .. })
        ));
        assert_eq!(contract.minted(), 1);
    }

    #[tokio::test]
    async fn test_transaction_shape() {
        let candidates = vec![
            MintCandidate::payable(MintFunction::ClaimTo { token_id: 0 }),
            MintCandidate::free(MintFunction::Mint),
        ];
        let contract = MockContract::empty().with_mint_function(MintFunction::Mint);
        let signer = MockSigner::new(buyer(), contract.clone());
        let mut invoker = MintInvoker::new(contract.address(), candidates.clone());
        let req = request(3);
        invoker.invoke(&signer, &req).await;
        let subs = signer.submissions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].to, contract.address());
        assert_eq!(subs[0].from, buyer());
        assert_eq!(subs[0].value, U256::from(300));
        assert_eq!(subs[0].data, candidates[0].calldata(buyer(), 3));
        // free candidates carry no value
        assert_eq!(subs[1].value, U256::zero());
        assert_eq!(contract.minted(), 3);
    }
}
