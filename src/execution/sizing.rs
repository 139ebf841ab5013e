use crate::api::Exchange;
use crate::error::BotError;
use crate::models::LotSizeRule;
use crate::Result;
use rust_decimal::Decimal;

/// Round `raw` down to a whole multiple of `step`
///
/// Never rounds up, so the order can not spend more than the notional.
/// A zero step leaves the quantity untouched. Fails if `raw` is too large
/// to count in steps of `step`.
pub fn quantize(raw: Decimal, step: Decimal) -> Result<Decimal> {
    if step <= Decimal::ZERO {
        return Ok(raw);
    }

    let steps = raw.checked_div(step).ok_or_else(|| {
        BotError::InvalidConfig(format!("quantity {} overflows step size {}", raw, step))
    })?;

    Ok(steps.floor() * step)
}

/// Convert a fiat notional into an order quantity at `price`
pub fn size_order(notional: Decimal, price: Decimal, rule: Option<&LotSizeRule>) -> Result<Decimal> {
    if price <= Decimal::ZERO {
        return Err(BotError::InvalidPrice(price));
    }

    let raw = notional
        .checked_div(price)
        .ok_or(BotError::InvalidPrice(price))?;

    let Some(rule) = rule else {
        tracing::warn!(quantity = %raw, "No LOT_SIZE rule, using unrounded quantity");
        return Ok(raw);
    };

    let quantity = quantize(raw, rule.step_size)?.normalize();
    if quantity.is_zero() || quantity < rule.min_qty {
        return Err(BotError::BelowMinimumQuantity {
            quantity,
            min_qty: rule.min_qty,
        });
    }

    Ok(quantity)
}

/// Fetch price and LOT_SIZE for `symbol` and size an order worth `notional`
pub async fn order_quantity<E: Exchange + ?Sized>(
    exchange: &E,
    symbol: &str,
    notional: Decimal,
) -> Result<Decimal> {
    let price = exchange.price(symbol).await?;
    let rule = exchange.lot_size(symbol).await?;

    let quantity = size_order(notional, price, rule.as_ref())?;

    tracing::debug!(
        symbol = %symbol,
        price = %price,
        notional = %notional,
        quantity = %quantity,
        "Sized order"
    );

    Ok(quantity)
}
