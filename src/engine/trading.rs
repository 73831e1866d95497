//! Synthetic token trading: buy and sell against the oracle price.
//!
//! Every precondition is checked and every derived amount computed before the
//! first mutation. The settlement transfer is the only fallible mutation, so
//! a failure anywhere leaves no partial state.

use super::core::Engine;
use super::results::{EngineError, PurchaseReceipt, SaleReceipt};
use crate::events::{EventPayload, TokensPurchasedEvent, TokensSoldEvent, TokensTransferredEvent};
use crate::settlement::SettlementBank;
use crate::token::TokenError;
use crate::types::{
    apply_bps_floor, narrow_amount, AccountId, Amount, ArithmeticError, CommodityId, Quantity,
};

impl<B: SettlementBank> Engine<B> {
    /// Exchange settlement currency for synthetic exposure tokens at the
    /// current price. A purchase too small to cover one whole token succeeds
    /// and mints zero; the truncation is the contract, not an error.
    pub fn buy_tokens(
        &mut self,
        account: AccountId,
        commodity_id: CommodityId,
        pay_amount: Amount,
    ) -> Result<PurchaseReceipt, EngineError> {
        self.ensure_market_open()?;
        let commodity = self
            .commodities
            .get_active(commodity_id)
            .map_err(|_| EngineError::InvalidCommodity(commodity_id))?;
        if pay_amount.is_zero() {
            return Err(EngineError::InvalidAmount("payment must be positive"));
        }
        self.ensure_oracle_fresh(commodity_id)?;

        let price = commodity.price;
        let fee = Amount(apply_bps_floor(pay_amount.value(), self.config.fee_rate_bps)?);
        let net = pay_amount.checked_sub(fee)?;
        let tokens = Quantity(net.value() / price.value());

        // overflow precheck so the mint after the transfer cannot fail
        self.tokens
            .balance(account, commodity_id)
            .value()
            .checked_add(tokens.value())
            .ok_or(EngineError::Arithmetic(ArithmeticError::Overflow))?;

        self.bank.transfer_in(account, pay_amount)?;
        self.tokens.mint(account, commodity_id, tokens)?;
        let balance = self.tokens.balance(account, commodity_id);
        self.ledgers.set_token_balance(account, commodity_id, balance);

        tracing::info!(
            account = account.0,
            commodity = commodity_id.0,
            paid = pay_amount.value(),
            minted = tokens.value(),
            "tokens purchased"
        );
        self.emit_event(EventPayload::TokensPurchased(TokensPurchasedEvent {
            account,
            commodity_id,
            paid: pay_amount,
            fee,
            tokens,
            price,
        }));

        Ok(PurchaseReceipt {
            tokens,
            paid: pay_amount,
            fee,
            price,
        })
    }

    /// Redeem tokens for settlement currency at the current price, net of fee.
    pub fn sell_tokens(
        &mut self,
        account: AccountId,
        commodity_id: CommodityId,
        token_amount: Quantity,
    ) -> Result<SaleReceipt, EngineError> {
        self.ensure_market_open()?;
        let commodity = self
            .commodities
            .get_active(commodity_id)
            .map_err(|_| EngineError::InvalidCommodity(commodity_id))?;
        if token_amount.is_zero() {
            return Err(EngineError::InvalidAmount("token amount must be positive"));
        }
        self.ensure_oracle_fresh(commodity_id)?;

        let balance = self.tokens.balance(account, commodity_id);
        if balance < token_amount {
            return Err(EngineError::Token(TokenError::InsufficientBalance {
                account,
                commodity_id,
                requested: token_amount,
                available: balance,
            }));
        }

        let price = commodity.price;
        let value = narrow_amount(
            u128::from(token_amount.value()) * u128::from(price.value()),
        )?;
        let fee = Amount(apply_bps_floor(value.value(), self.config.fee_rate_bps)?);
        let proceeds = value.checked_sub(fee)?;

        self.bank.transfer_out(account, proceeds)?;
        self.tokens.burn(account, commodity_id, token_amount)?;
        let balance = self.tokens.balance(account, commodity_id);
        self.ledgers.set_token_balance(account, commodity_id, balance);

        tracing::info!(
            account = account.0,
            commodity = commodity_id.0,
            burned = token_amount.value(),
            proceeds = proceeds.value(),
            "tokens sold"
        );
        self.emit_event(EventPayload::TokensSold(TokensSoldEvent {
            account,
            commodity_id,
            tokens: token_amount,
            fee,
            proceeds,
            price,
        }));

        Ok(SaleReceipt {
            tokens: token_amount,
            proceeds,
            fee,
            price,
        })
    }

    /// Move exposure between holders. No pricing involved, so neither the
    /// market flag nor oracle freshness gates it.
    pub fn transfer_tokens(
        &mut self,
        from: AccountId,
        to: AccountId,
        commodity_id: CommodityId,
        amount: Quantity,
    ) -> Result<(), EngineError> {
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount("transfer must be positive"));
        }
        if self.commodities.get(commodity_id).is_none() {
            return Err(EngineError::InvalidCommodity(commodity_id));
        }

        self.tokens.transfer(from, to, commodity_id, amount)?;
        let from_balance = self.tokens.balance(from, commodity_id);
        let to_balance = self.tokens.balance(to, commodity_id);
        self.ledgers.set_token_balance(from, commodity_id, from_balance);
        self.ledgers.set_token_balance(to, commodity_id, to_balance);

        self.emit_event(EventPayload::TokensTransferred(TokensTransferredEvent {
            from,
            to,
            commodity_id,
            amount,
        }));
        Ok(())
    }
}
