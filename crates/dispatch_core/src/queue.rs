//! Time-ordered holding area for bookings awaiting a match.
//!
//! Bookings are keyed by booking time with ties broken by admission order,
//! so iteration is a stable FIFO within equal timestamps. A booking that is
//! re-admitted after a failed pass keeps its original booking time and only
//! moves backwards among equal timestamps.

use crate::booking::Booking;
use crate::ids::BookingId;

#[derive(Debug, Clone)]
struct QueueEntry {
    booking: Booking,
    seq: u64,
}

/// Pending bookings in matching order.
#[derive(Debug, Default, Clone)]
pub struct BookingQueue {
    entries: Vec<QueueEntry>,
    next_seq: u64,
}

impl BookingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a booking at its time-ordered position. Admission order is the
    /// tie-break for equal booking times.
    pub fn admit(&mut self, booking: Booking) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let at = self
            .entries
            .partition_point(|e| e.booking.booking_time <= booking.booking_time);
        self.entries.insert(at, QueueEntry { booking, seq });
        debug_assert!(self.entries.windows(2).all(|w| {
            w[0].booking.booking_time < w[1].booking.booking_time
                || (w[0].booking.booking_time == w[1].booking.booking_time && w[0].seq < w[1].seq)
        }));
    }

    /// The booking that has waited longest.
    pub fn peek_oldest(&self) -> Option<&Booking> {
        self.entries.first().map(|e| &e.booking)
    }

    /// Remove a booking by identity, e.g. once it has been matched.
    pub fn remove(&mut self, id: BookingId) -> Option<Booking> {
        let at = self.entries.iter().position(|e| e.booking.id == id)?;
        Some(self.entries.remove(at).booking)
    }

    pub fn contains(&self, id: BookingId) -> bool {
        self.entries.iter().any(|e| e.booking.id == id)
    }

    /// Bookings in queue order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &Booking> {
        self.entries.iter().map(|e| &e.booking)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
