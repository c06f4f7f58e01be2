//! The commodity pricing tick.
//!
//! Each epoch, every commodity price moves under three forces:
//!
//! 1. **Noise** -- a bounded uniform fluctuation in `[-volatility,
//!    +volatility]`, sampled in integer hundredths from the caller's RNG.
//! 2. **Scarcity pressure** -- `demand / max(1, supply)`; above 1.2 adds a
//!    unit of shortage pressure, below 0.8 subtracts a unit of glut
//!    pressure.
//! 3. **Route reversion** -- each active route carrying the commodity pulls
//!    the price 0.5 back toward its base (trade arbitrages extremes away).
//!
//! Prices are floored at 1 and rounded to two decimal places. Moves larger
//! than one unit in a single tick are recorded as [`MarketEvent`] audit
//! entries.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use dominion_types::{MarketEvent, WorldState};

/// Scarcity ratio above which shortage pressure applies.
const SHORTAGE_THRESHOLD: Decimal = Decimal::from_parts(12, 0, 0, false, 1);

/// Scarcity ratio below which glut pressure applies.
const GLUT_THRESHOLD: Decimal = Decimal::from_parts(8, 0, 0, false, 1);

/// Price pull toward base exerted by each active route.
const ROUTE_PULL: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Run one pricing tick over every commodity in the world.
///
/// The RNG is supplied by the caller so tests can seed it; production runs
/// pass a thread RNG. Prices never fall below 1.
pub fn simulate_economy<R: Rng + ?Sized>(state: &mut WorldState, rng: &mut R) {
    let epoch = state.time.epoch;

    // Pre-compute route counts before taking the mutable borrow on the
    // commodity list.
    let active_routes: Vec<u32> = state
        .economy
        .commodities
        .iter()
        .map(|c| u32::try_from(state.map.active_route_count(&c.name)).unwrap_or(u32::MAX))
        .collect();

    let mut moves: Vec<MarketEvent> = Vec::new();

    for (commodity, routes) in state.economy.commodities.iter_mut().zip(active_routes) {
        let before = commodity.current_price;

        let noise = sample_noise(commodity.volatility, rng);

        let scarcity =
            Decimal::from(commodity.demand) / Decimal::from(commodity.supply.max(1));
        let pressure = if scarcity > SHORTAGE_THRESHOLD {
            Decimal::ONE
        } else if scarcity < GLUT_THRESHOLD {
            -Decimal::ONE
        } else {
            Decimal::ZERO
        };

        // Routes arbitrage the price back toward base, stronger with more
        // active routes.
        let route_factor = ROUTE_PULL * Decimal::from(routes);
        let reversion = if commodity.current_price > commodity.base_price {
            -route_factor
        } else if commodity.current_price < commodity.base_price {
            route_factor
        } else {
            Decimal::ZERO
        };

        let next = (before + pressure + noise + reversion)
            .max(Decimal::ONE)
            .round_dp(2);
        commodity.current_price = next;

        debug!(
            epoch,
            commodity = %commodity.name,
            %before,
            %next,
            %scarcity,
            routes,
            "price tick"
        );

        if (next - before).abs() > Decimal::ONE {
            moves.push(MarketEvent {
                epoch,
                commodity: commodity.name.clone(),
                price_before: before,
                price_after: next,
                text: format!(
                    "{} price moved from {before} to {next}",
                    commodity.name
                ),
            });
        }
    }

    state.economy.market_events.extend(moves);
}

/// Sample a uniform price fluctuation in `[-volatility, +volatility]`,
/// quantized to hundredths.
fn sample_noise<R: Rng + ?Sized>(volatility: Decimal, rng: &mut R) -> Decimal {
    let bound = (volatility * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or(0)
        .max(0);
    if bound == 0 {
        return Decimal::ZERO;
    }
    Decimal::new(rng.random_range(-bound..=bound), 2)
}
