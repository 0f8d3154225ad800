//! Booking ingestion: pulls bookings into the driver as simulation time
//! passes their booking timestamps.
//!
//! Sources must be sorted by booking time; a single record of lookahead is
//! kept so only due bookings are released each tick.

use std::fs::File;
use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::booking::Booking;
use crate::error::IngestionError;
use crate::geo::Position;
use crate::ids::{BookingId, CustomerId};

/// A time-ordered stream of bookings.
pub trait BookingSource {
    /// All bookings with `booking_time <= now` not yet returned.
    fn next_due(&mut self, now: f64) -> Result<Vec<Booking>, IngestionError>;

    /// True once the stream can never yield another booking.
    fn is_exhausted(&self) -> bool;
}

/// In-memory source over a pre-sorted booking list.
#[derive(Debug, Default, Clone)]
pub struct StaticBookingSource {
    bookings: Vec<Booking>,
    cursor: usize,
}

impl StaticBookingSource {
    pub fn new(mut bookings: Vec<Booking>) -> Self {
        bookings.sort_by(|a, b| {
            a.booking_time
                .partial_cmp(&b.booking_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self {
            bookings,
            cursor: 0,
        }
    }
}

impl BookingSource for StaticBookingSource {
    fn next_due(&mut self, now: f64) -> Result<Vec<Booking>, IngestionError> {
        let start = self.cursor;
        while self.cursor < self.bookings.len()
            && self.bookings[self.cursor].booking_time <= now
        {
            self.cursor += 1;
        }
        Ok(self.bookings[start..self.cursor].to_vec())
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.bookings.len()
    }
}

/// On-disk booking record layout (one CSV row per booking).
#[derive(Debug, Clone, Deserialize)]
struct BookingRecord {
    id: u64,
    booking_time: f64,
    customer_id: u64,
    pickup_x: f64,
    pickup_y: f64,
    dropoff_x: f64,
    dropoff_y: f64,
}

impl From<BookingRecord> for Booking {
    fn from(record: BookingRecord) -> Self {
        Booking {
            id: BookingId(record.id),
            customer: CustomerId(record.customer_id),
            pickup: Position::new(record.pickup_x, record.pickup_y),
            dropoff: Position::new(record.dropoff_x, record.dropoff_y),
            booking_time: record.booking_time,
        }
    }
}

/// Streaming CSV booking source. Reads one record ahead so an arbitrarily
/// large file never sits in memory.
pub struct CsvBookingSource<R: io::Read> {
    records: csv::DeserializeRecordsIntoIter<R, BookingRecord>,
    lookahead: Option<Booking>,
    /// Read failure held back so bookings already collected in the same
    /// batch are delivered first.
    pending_error: Option<IngestionError>,
    exhausted: bool,
}

impl CsvBookingSource<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IngestionError> {
        let reader = csv::Reader::from_path(path)?;
        Ok(Self::new(reader))
    }
}

impl<R: io::Read> CsvBookingSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(csv::Reader::from_reader(reader))
    }

    fn new(reader: csv::Reader<R>) -> Self {
        Self {
            records: reader.into_deserialize(),
            lookahead: None,
            pending_error: None,
            exhausted: false,
        }
    }

    fn pull(&mut self) -> Result<Option<Booking>, IngestionError> {
        match self.records.next() {
            Some(Ok(record)) => Ok(Some(record.into())),
            Some(Err(err)) => Err(err.into()),
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}

impl<R: io::Read> BookingSource for CsvBookingSource<R> {
    fn next_due(&mut self, now: f64) -> Result<Vec<Booking>, IngestionError> {
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }
        let mut due = Vec::new();
        loop {
            if self.lookahead.is_none() && !self.exhausted {
                match self.pull() {
                    Ok(next) => self.lookahead = next,
                    Err(err) if due.is_empty() => return Err(err),
                    Err(err) => {
                        self.pending_error = Some(err);
                        return Ok(due);
                    }
                }
            }
            match self.lookahead {
                Some(booking) if booking.booking_time <= now => {
                    due.push(booking);
                    self.lookahead = None;
                }
                _ => return Ok(due),
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted && self.lookahead.is_none()
    }
}
