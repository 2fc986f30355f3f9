//! Transaction composition and settlement.
//!
//! A trade intent is translated into a two-leg transaction set: an asset
//! transfer moving the index token and an algo payment running in the
//! opposite direction. Both legs are built off one network-parameter
//! snapshot, then driven to a terminal state one by one: signed, submitted
//! and confirmed when the leg's credentials are present, or serialized to an
//! artifact file for out-of-band signing when they are not.

use crate::core::coin::{Basket, MarketDataProvider};
use crate::core::currency::RateOracle;
use crate::core::error::EtfError;
use crate::core::ledger::{LedgerClient, NetworkParams};
use crate::core::nav::{self, WeightingStrategy};
use crate::core::txn::{self, Address, SigningCredentials, Transaction};
use std::fmt::Display;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const MICROALGOS_PER_ALGO: f64 = 1_000_000.0;

/// Settlement currency pair used to convert the USD valuation into algos.
const SETTLEMENT_PAIR: (&str, &str) = ("ALGO", "USD");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Buy,
    Sell,
    Exchange,
}

impl Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                IntentKind::Buy => "buy",
                IntentKind::Sell => "sell",
                IntentKind::Exchange => "exchange",
            }
        )
    }
}

/// One side of a trade: an address plus the credentials to sign for it, if
/// held locally. A party without credentials gets its legs persisted
/// unsigned instead of submitted.
#[derive(Debug, Clone)]
pub struct TradeParty {
    pub address: String,
    pub credentials: Option<SigningCredentials>,
}

/// A buy/sell/exchange request with roles already assigned.
#[derive(Debug, Clone)]
pub struct TradeIntent {
    pub kind: IntentKind,
    pub token_sender: TradeParty,
    pub token_receiver: TradeParty,
    pub index_units: u64,
}

impl TradeIntent {
    /// Role assignment table. On a buy the index token leaves the fund pool;
    /// on a sell it returns to it; an exchange keeps the caller's roles as
    /// given (first party sends the token). The settlement leg always runs
    /// opposite to the token leg: whoever receives the index token pays.
    pub fn assign(
        kind: IntentKind,
        fund: TradeParty,
        account: TradeParty,
        index_units: u64,
    ) -> Self {
        let (token_sender, token_receiver) = match kind {
            IntentKind::Buy => (fund, account),
            IntentKind::Sell => (account, fund),
            IntentKind::Exchange => (fund, account),
        };
        TradeIntent {
            kind,
            token_sender,
            token_receiver,
            index_units,
        }
    }
}

/// Valuation snapshot backing one trade. Computed fresh per intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Index price per unit, in USD.
    pub nav: f64,
    /// ALGO/USD spot rate.
    pub algo_rate: f64,
    /// Settlement amount in algos.
    pub algo_amount: f64,
    /// Settlement amount in microalgos, as carried by the payment leg.
    pub micro_algos: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegKind {
    AssetTransfer,
    Payment,
}

impl Display for LegKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                LegKind::AssetTransfer => "transfer",
                LegKind::Payment => "settlement",
            }
        )
    }
}

/// One transaction within a set, paired with the credentials that sign it.
#[derive(Debug, Clone)]
pub struct Leg {
    pub kind: LegKind,
    pub txn: Transaction,
    pub signer: Option<SigningCredentials>,
}

/// The ordered legs of one economic exchange. Owned by the call that built
/// it and discarded after settlement.
#[derive(Debug, Clone)]
pub struct TransactionSet {
    pub params: NetworkParams,
    pub legs: Vec<Leg>,
}

/// Terminal state of a settled leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegOutcome {
    Confirmed { tx_id: String, round: u64 },
    UnsignedPersisted { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct LegReceipt {
    pub kind: LegKind,
    pub outcome: LegOutcome,
}

/// Result of driving a full intent: the quote it was priced at and one
/// receipt per leg, every one of them terminal.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub quote: Quote,
    pub receipts: Vec<LegReceipt>,
}

/// Bounds the confirmation wait. The token lets an embedding caller abort
/// the wait early instead of riding out a misconfigured round budget.
#[derive(Debug, Clone)]
pub struct ConfirmationPolicy {
    pub max_rounds: u64,
    pub cancel: CancellationToken,
}

impl ConfirmationPolicy {
    pub fn bounded(max_rounds: u64) -> Self {
        ConfirmationPolicy {
            max_rounds,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(max_rounds: u64, cancel: CancellationToken) -> Self {
        ConfirmationPolicy { max_rounds, cancel }
    }
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        ConfirmationPolicy::bounded(100)
    }
}

pub struct Composer<'a> {
    pub market: &'a dyn MarketDataProvider,
    pub rates: &'a dyn RateOracle,
    pub ledger: &'a dyn LedgerClient,
    pub basket: &'a Basket,
    pub asset_id: u64,
    pub strategy: WeightingStrategy,
    pub confirmation: ConfirmationPolicy,
    pub artifact_dir: PathBuf,
}

impl Composer<'_> {
    /// Price the trade. The NAV computation and the settlement-rate fetch
    /// are independent and run concurrently.
    pub async fn quote(&self, index_units: u64) -> Result<Quote, EtfError> {
        let (from, to) = SETTLEMENT_PAIR;
        let (nav, rate) = tokio::join!(
            nav::basket_valuation(self.basket, self.market, self.strategy),
            self.rates.get_rate(from, to)
        );
        let nav = nav?;
        let algo_rate = rate?;
        if algo_rate <= 0.0 {
            return Err(EtfError::DivisionByZero);
        }

        let algo_amount = (nav / algo_rate) * index_units as f64;
        let micro_algos = (algo_amount * MICROALGOS_PER_ALGO).round() as u64;
        debug!(nav, algo_rate, micro_algos, "Priced trade");
        Ok(Quote {
            nav,
            algo_rate,
            algo_amount,
            micro_algos,
        })
    }

    /// Build both legs from one parameter snapshot so they share a validity
    /// window. Refetching per leg could land the legs in different windows.
    pub fn build(
        &self,
        intent: &TradeIntent,
        quote: &Quote,
        params: &NetworkParams,
    ) -> Result<TransactionSet, EtfError> {
        let token_sender = Address::decode(&intent.token_sender.address)?;
        let token_receiver = Address::decode(&intent.token_receiver.address)?;

        let token_leg = Leg {
            kind: LegKind::AssetTransfer,
            txn: Transaction::asset_transfer(
                params,
                token_sender,
                token_receiver,
                self.asset_id,
                intent.index_units,
            ),
            signer: intent.token_sender.credentials.clone(),
        };
        let settlement_leg = Leg {
            kind: LegKind::Payment,
            txn: Transaction::payment(params, token_receiver, token_sender, quote.micro_algos),
            signer: intent.token_receiver.credentials.clone(),
        };

        Ok(TransactionSet {
            params: params.clone(),
            legs: vec![token_leg, settlement_leg],
        })
    }

    /// Quote, build and drive an intent until every leg is terminal.
    pub async fn settle(&self, intent: TradeIntent) -> Result<Settlement, EtfError> {
        info!(kind = %intent.kind, units = intent.index_units, "Settling trade");
        let quote = self.quote(intent.index_units).await?;
        let params = self.ledger.suggested_params().await?;
        let set = self.build(&intent, &quote, &params)?;
        let receipts = self.submit_set(set).await?;
        Ok(Settlement { quote, receipts })
    }

    /// Drive each leg to a terminal state in order. A failing leg aborts the
    /// set and reports which legs already completed.
    async fn submit_set(&self, set: TransactionSet) -> Result<Vec<LegReceipt>, EtfError> {
        let mut receipts: Vec<LegReceipt> = Vec::with_capacity(set.legs.len());
        for leg in &set.legs {
            match self.settle_leg(leg).await {
                Ok(outcome) => receipts.push(LegReceipt {
                    kind: leg.kind,
                    outcome,
                }),
                Err(e) => {
                    let completed = receipts.iter().map(|r| r.kind.to_string()).collect();
                    return Err(EtfError::Settlement {
                        leg: leg.kind.to_string(),
                        completed,
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(receipts)
    }

    async fn settle_leg(&self, leg: &Leg) -> Result<LegOutcome, EtfError> {
        match &leg.signer {
            Some(credentials) => {
                let signed = credentials.sign(&leg.txn)?;
                let tx_id = self.ledger.submit(&signed.encode()?).await?;
                info!(%tx_id, leg = %leg.kind, "Submitted transaction");
                let round = self
                    .wait_for_confirmation(&leg.kind.to_string(), &tx_id)
                    .await?;
                Ok(LegOutcome::Confirmed { tx_id, round })
            }
            None => {
                let path = self.artifact_dir.join(format!("{}.txn", leg.kind));
                txn::write_unsigned_to_file(&leg.txn, &path)?;
                info!(path = %path.display(), leg = %leg.kind, "Persisted unsigned transaction");
                Ok(LegOutcome::UnsignedPersisted { path })
            }
        }
    }

    /// Poll the pending pool once per new block until the transaction
    /// confirms, the pool rejects it, the round budget runs out, or the
    /// caller cancels. A wait-for-success loop, not a retry loop: any error
    /// response is terminal.
    pub async fn wait_for_confirmation(&self, leg: &str, tx_id: &str) -> Result<u64, EtfError> {
        let max_rounds = self.confirmation.max_rounds;
        let mut round = self.ledger.last_round().await?;

        for attempt in 1..=max_rounds {
            if self.confirmation.cancel.is_cancelled() {
                return Err(EtfError::Cancelled {
                    leg: leg.to_string(),
                    tx_id: tx_id.to_string(),
                });
            }

            let pending = self.ledger.pending_transaction(tx_id).await?;
            if !pending.pool_error.is_empty() {
                return Err(EtfError::PoolRejection {
                    leg: leg.to_string(),
                    tx_id: tx_id.to_string(),
                    reason: pending.pool_error,
                });
            }
            if pending.confirmed_round > 0 {
                info!(%tx_id, round = pending.confirmed_round, "Transaction confirmed");
                return Ok(pending.confirmed_round);
            }

            // Budget exhausted, no point waiting out another block.
            if attempt == max_rounds {
                break;
            }

            debug!(%tx_id, attempt, "Waiting for confirmation");
            round += 1;
            tokio::select! {
                _ = self.confirmation.cancel.cancelled() => {
                    return Err(EtfError::Cancelled {
                        leg: leg.to_string(),
                        tx_id: tx_id.to_string(),
                    });
                }
                result = self.ledger.wait_for_round_after(round) => result?,
            }
        }

        Err(EtfError::ConfirmationTimeout {
            leg: leg.to_string(),
            tx_id: tx_id.to_string(),
            rounds: max_rounds,
        })
    }
}
