//! Open position, realized trades and the fill log.

use chrono::NaiveDateTime;
use serde::Serialize;

/// The single long position held by the simulator. Never mutated after entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub quantity: f64,
    /// Exit at or below this close. `None` when the stop pct is 0.
    pub stop_loss: Option<f64>,
    /// Exit at or above this close. `None` when the target pct is 0.
    pub take_profit: Option<f64>,
}

impl Position {
    pub fn open(
        entry_price: f64,
        entry_time: NaiveDateTime,
        quantity: f64,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Self {
        let stop_loss = (stop_loss_pct > 0.0).then(|| entry_price * (1.0 - stop_loss_pct / 100.0));
        let take_profit =
            (take_profit_pct > 0.0).then(|| entry_price * (1.0 + take_profit_pct / 100.0));
        Position {
            entry_price,
            entry_time,
            quantity,
            stop_loss,
            take_profit,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.entry_price)
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        self.stop_loss.is_some_and(|level| price <= level)
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        self.take_profit.is_some_and(|level| price >= level)
    }

    /// Close the position at `exit_price`, producing the realized trade.
    pub fn close(self, exit_price: f64, exit_time: NaiveDateTime, reason: ExitReason) -> Trade {
        Trade {
            entry_time: self.entry_time,
            exit_time,
            entry_price: self.entry_price,
            exit_price,
            quantity: self.quantity,
            pnl: self.unrealized_pnl(exit_price),
            exit_reason: reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
}

/// A realized round trip. Open positions never appear as trades.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub pnl: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn duration_days(&self) -> f64 {
        crate::domain::price::span_days(self.entry_time, self.exit_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

/// One BUY or SELL transition, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub side: Side,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub quantity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_position() -> Position {
        Position::open(100.0, at(15), 2.0, 5.0, 10.0)
    }

    #[test]
    fn open_derives_exit_levels() {
        let pos = sample_position();
        assert!((pos.stop_loss.unwrap() - 95.0).abs() < 1e-9);
        assert!((pos.take_profit.unwrap() - 110.0).abs() < 1e-9);
    }

    #[test]
    fn market_value_and_unrealized_pnl() {
        let pos = sample_position();
        assert!((pos.market_value(105.0) - 210.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(105.0) - 10.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(90.0) - (-20.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_loss_triggered() {
        let pos = sample_position();
        assert!(pos.should_stop_loss(94.0));
        assert!(pos.should_stop_loss(pos.stop_loss.unwrap()));
        assert!(!pos.should_stop_loss(96.0));
    }

    #[test]
    fn take_profit_triggered() {
        let pos = sample_position();
        assert!(pos.should_take_profit(111.0));
        assert!(pos.should_take_profit(pos.take_profit.unwrap()));
        assert!(!pos.should_take_profit(109.0));
    }

    #[test]
    fn zero_pct_disables_exits() {
        let pos = Position::open(100.0, at(15), 1.0, 0.0, 0.0);
        assert!(!pos.should_stop_loss(0.0));
        assert!(!pos.should_take_profit(1_000_000.0));
        assert_eq!((pos.stop_loss, pos.take_profit), (None, None));
    }

    #[test]
    fn full_stop_loss_still_fires_at_zero() {
        let pos = Position::open(100.0, at(15), 1.0, 100.0, 0.0);
        assert_eq!(pos.stop_loss, Some(0.0));
        assert!(pos.should_stop_loss(0.0));
        assert!(!pos.should_stop_loss(0.5));
    }

    #[test]
    fn take_profit_on_zero_entry_is_active() {
        let pos = Position::open(0.0, at(15), 1.0, 0.0, 10.0);
        assert_eq!(pos.take_profit, Some(0.0));
        assert!(pos.should_take_profit(0.0));
        assert!(pos.should_take_profit(3.0));
    }

    #[test]
    fn close_realizes_pnl() {
        let trade = sample_position().close(104.0, at(20), ExitReason::Signal);
        assert_eq!(trade.entry_time, at(15));
        assert_eq!(trade.exit_time, at(20));
        assert!((trade.pnl - 8.0).abs() < f64::EPSILON);
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        assert!((trade.duration_days() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unit_quantity_pnl_is_price_difference() {
        let trade = Position::open(100.0, at(1), 1.0, 0.0, 0.0).close(
            93.5,
            at(2),
            ExitReason::Signal,
        );
        assert_eq!(trade.pnl, 93.5 - 100.0);
    }
}
