/*
 * Timestamp helpers shared by persistence and export. Snapshot stamps are
 * ISO-8601 with second resolution and a numeric UTC offset
 * (`2024-05-01T10:00:00+02:00`); export file names use a compact
 * `YYYY-MM-DD_HHMMSS` form. The local offset is used when the platform can
 * determine it, otherwise UTC.
 */
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|e| {
        log::trace!("Timestamps: Local offset unavailable ({e}), using UTC.");
        OffsetDateTime::now_utc()
    })
}

pub fn format_iso(moment: OffsetDateTime) -> String {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
    );
    match moment.format(format) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Timestamps: Failed to format {moment:?} as ISO-8601: {e}");
            moment.to_string()
        }
    }
}

pub fn now_iso() -> String {
    format_iso(now())
}

pub fn format_file_stamp(moment: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]_[hour][minute][second]");
    match moment.format(format) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Timestamps: Failed to format {moment:?} as file stamp: {e}");
            moment.unix_timestamp().to_string()
        }
    }
}

pub fn parse_iso(text: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(text.trim(), &Rfc3339).ok()
}

/*
 * Produces the `updatedAt` value for the next version. If the wall clock has
 * stepped back behind `previous`, the previous stamp is kept so `updatedAt`
 * never decreases. Unparseable previous values are simply replaced.
 */
pub fn next_stamp_after(previous: &str, moment: OffsetDateTime) -> String {
    match parse_iso(previous) {
        Some(prev) if prev > moment => {
            log::debug!("Timestamps: Clock is behind last stamp '{previous}', keeping it.");
            previous.to_string()
        }
        _ => format_iso(moment),
    }
}
