use chrono::{Days, NaiveDate};

use super::roster::Position;
use super::schema::Record;

// ---------------------------------------------------------------------------
// Window – the user's time / population selection
// ---------------------------------------------------------------------------

/// Trailing window plus optional population restriction.
///
/// `days == 0` keeps the most recent date only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub days: u32,
    pub position: Option<Position>,
}

impl Window {
    pub fn new(days: u32, position: Option<Position>) -> Self {
        Window { days, position }
    }

    /// Inclusive `[upper - days, upper]`.
    pub fn bounds(&self, upper: NaiveDate) -> (NaiveDate, NaiveDate) {
        let lower = upper
            .checked_sub_days(Days::new(u64::from(self.days)))
            .unwrap_or(NaiveDate::MIN);
        (lower, upper)
    }
}

// ---------------------------------------------------------------------------
// View – a borrowed, read-only subset of a record table
// ---------------------------------------------------------------------------

/// Rows selected from a table. The table itself is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct View<'a, R> {
    rows: Vec<&'a R>,
}

impl<'a, R: Record> View<'a, R> {
    /// Every row of `rows`, in order.
    pub fn all(rows: &'a [R]) -> Self {
        View {
            rows: rows.iter().collect(),
        }
    }

    /// Keep the rows inside `window`, measured from this view's latest date.
    pub fn filter(&self, window: Window) -> View<'a, R> {
        let Some(upper) = self.latest_date() else {
            return View { rows: Vec::new() };
        };
        let (lower, upper) = window.bounds(upper);

        let rows = self
            .rows
            .iter()
            .copied()
            .filter(|r| {
                let d = r.date();
                lower <= d && d <= upper
            })
            .filter(|r| match window.position {
                Some(p) => r.position() == Some(p),
                None => true,
            })
            .collect();
        View { rows }
    }

    /// Further restrict with an arbitrary predicate.
    pub fn retain(&self, keep: impl Fn(&R) -> bool) -> View<'a, R> {
        View {
            rows: self.rows.iter().copied().filter(|&r| keep(r)).collect(),
        }
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date()).max()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a R> + '_ {
        self.rows.iter().copied()
    }

    pub fn rows(&self) -> &[&'a R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rows of `rows` within `days` of the latest date, restricted to
/// `position` when given. Unmatched athletes (no position) only survive
/// when no position is requested.
pub fn filter_dataset<R: Record>(rows: &[R], days: u32, position: Option<Position>) -> View<'_, R> {
    View::all(rows).filter(Window::new(days, position))
}
