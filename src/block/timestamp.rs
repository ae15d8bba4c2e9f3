use crate::converter::*;
use chrono::{DateTime, Datelike, Local, Offset, Timelike, Utc};
use std::fmt;

pub const TIMESTAMP_SIZE: usize = 16;

const YEAR: usize = 0;
const MON: usize = 2;
const DAY: usize = 3;
const HOUR: usize = 4;
const MIN: usize = 5;
const SEC: usize = 6;
const NSEC: usize = 8;
const OFFSET: usize = 12;

/// ISO 8601-like point in time. All-zero means "not recorded".
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Timestamp {
    pub year: u16,
    pub mon: u8,
    pub day: u8,
    pub hour: u8,
    pub min: u8,
    /// 60 only for a leap second.
    pub sec: u8,
    pub nsec: u32,
    /// Local offset from UTC in minutes.
    pub offset: i16,
}

impl Timestamp {
    pub fn null() -> Self {
        Self::default()
    }

    /// Current UTC date and time, tagged with the local UTC offset.
    pub fn now() -> Self {
        let offset = Local::now().offset().fix().local_minus_utc() / 60;
        Self::from_utc(Utc::now(), offset)
    }

    /// `offset` is the local offset from UTC in minutes. A leap second
    /// (chrono's nanoseconds past 1e9) is stored as second 60.
    pub fn from_utc(utc: DateTime<Utc>, offset: i32) -> Self {
        let mut sec = utc.second();
        let mut nsec = utc.nanosecond();
        if nsec >= 1_000_000_000 {
            sec += 1;
            nsec -= 1_000_000_000;
        }
        Timestamp {
            year: utc.year().clamp(0, 9999) as u16,
            mon: utc.month() as u8,
            day: utc.day() as u8,
            hour: utc.hour() as u8,
            min: utc.minute() as u8,
            sec: sec as u8,
            nsec,
            offset: offset as i16,
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::null()
    }

    pub fn decode(buf: &[u8]) -> Self {
        Timestamp {
            year: get_u16(buf, YEAR),
            mon: buf[MON],
            day: buf[DAY],
            hour: buf[HOUR],
            min: buf[MIN],
            sec: buf[SEC],
            nsec: get_u32(buf, NSEC),
            offset: get_i16(buf, OFFSET),
        }
    }

    /// Writes all 16 bytes, zeroing the reserved ones.
    pub fn encode(&self, buf: &mut [u8]) {
        buf[..TIMESTAMP_SIZE].iter_mut().for_each(|b| *b = 0);
        put_u16(buf, YEAR, self.year);
        buf[MON] = self.mon;
        buf[DAY] = self.day;
        buf[HOUR] = self.hour;
        buf[MIN] = self.min;
        buf[SEC] = self.sec;
        put_u32(buf, NSEC, self.nsec);
        put_i16(buf, OFFSET, self.offset);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.offset < 0 { '-' } else { '+' };
        let off = i32::from(self.offset).abs();
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{}{}{:02}:{:02}",
            self.year,
            self.mon,
            self.day,
            self.hour,
            self.min,
            self.sec,
            self.nsec,
            sign,
            off / 60,
            off % 60
        )
    }
}
