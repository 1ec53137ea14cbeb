use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use crate::models::{
    CancellationRecord, GuestCounts, PaymentRecord, PaymentStatus, PricingSnapshot, Property,
    Reservation, ReservationStatus, Review,
};

// ── Properties ──

pub fn create_property(conn: &Connection, property: &Property) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO properties (id, host_id, title, city, accommodates, base_price, cleaning_fee, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            property.id,
            property.host_id,
            property.title,
            property.city,
            property.accommodates,
            property.base_price,
            property.cleaning_fee,
            property.is_active as i32,
            property.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            property.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_property(conn: &Connection, id: &str) -> anyhow::Result<Option<Property>> {
    let result = conn.query_row(
        "SELECT id, host_id, title, city, accommodates, base_price, cleaning_fee, is_active, created_at, updated_at
         FROM properties WHERE id = ?1",
        params![id],
        |row| Ok(parse_property_row(row)),
    );

    match result {
        Ok(property) => Ok(Some(property?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Default)]
pub struct PropertyFilter {
    pub city: Option<String>,
    pub guests: Option<i32>,
    pub max_price: Option<i64>,
}

pub fn search_properties(
    conn: &Connection,
    filter: &PropertyFilter,
    limit: i64,
) -> anyhow::Result<Vec<Property>> {
    let mut sql = String::from(
        "SELECT id, host_id, title, city, accommodates, base_price, cleaning_fee, is_active, created_at, updated_at
         FROM properties WHERE is_active = 1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(city) = &filter.city {
        params_vec.push(Box::new(city.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(city) = ?{}", params_vec.len()));
    }
    if let Some(guests) = filter.guests {
        params_vec.push(Box::new(guests));
        sql.push_str(&format!(" AND accommodates >= ?{}", params_vec.len()));
    }
    if let Some(max_price) = filter.max_price {
        params_vec.push(Box::new(max_price));
        sql.push_str(&format!(" AND base_price <= ?{}", params_vec.len()));
    }

    params_vec.push(Box::new(limit));
    sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ?{}", params_vec.len()));

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_property_row(row)))?;

    let mut properties = vec![];
    for row in rows {
        properties.push(row??);
    }
    Ok(properties)
}

pub fn set_property_active(conn: &Connection, id: &str, active: bool) -> anyhow::Result<bool> {
    let now = chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let count = conn.execute(
        "UPDATE properties SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
        params![active as i32, now, id],
    )?;
    Ok(count > 0)
}

fn parse_property_row(row: &rusqlite::Row) -> anyhow::Result<Property> {
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    Ok(Property {
        id: row.get(0)?,
        host_id: row.get(1)?,
        title: row.get(2)?,
        city: row.get(3)?,
        accommodates: row.get(4)?,
        base_price: row.get(5)?,
        cleaning_fee: row.get(6)?,
        is_active: row.get::<_, i32>(7)? != 0,
        created_at: NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")?,
        updated_at: NaiveDateTime::parse_from_str(&updated_at_str, "%Y-%m-%d %H:%M:%S")?,
    })
}

// ── Reservations ──

const RESERVATION_COLUMNS: &str = "id, property_id, guest_id, host_id, check_in, check_out, \
    adults, children, infants, status, special_requests, base_price, nights, subtotal, \
    cleaning_fee, service_fee, taxes, total, currency, payment_order_id, payment_status, \
    payment_updated_at, cancelled_by, cancelled_at, cancellation_reason, created_at, updated_at";

pub fn create_reservation(conn: &Connection, reservation: &Reservation) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reservations (id, property_id, guest_id, host_id, check_in, check_out,
            adults, children, infants, status, special_requests, base_price, nights, subtotal,
            cleaning_fee, service_fee, taxes, total, currency, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            reservation.id,
            reservation.property_id,
            reservation.guest_id,
            reservation.host_id,
            reservation.check_in.format("%Y-%m-%d").to_string(),
            reservation.check_out.format("%Y-%m-%d").to_string(),
            reservation.guests.adults,
            reservation.guests.children,
            reservation.guests.infants,
            reservation.status.as_str(),
            reservation.special_requests,
            reservation.pricing.base_price,
            reservation.pricing.nights,
            reservation.pricing.subtotal,
            reservation.pricing.cleaning_fee,
            reservation.pricing.service_fee,
            reservation.pricing.taxes,
            reservation.pricing.total,
            reservation.pricing.currency,
            reservation.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            reservation.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_reservation(conn: &Connection, id: &str) -> anyhow::Result<Option<Reservation>> {
    let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_reservation_row(row)));

    match result {
        Ok(reservation) => Ok(Some(reservation?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Half-open range intersection against reservations still holding the
/// property: existing.check_in < new.check_out AND new.check_in < existing.check_out.
pub fn has_overlapping_reservation(
    conn: &Connection,
    property_id: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> anyhow::Result<bool> {
    let result: Result<String, _> = conn.query_row(
        "SELECT id FROM reservations
         WHERE property_id = ?1
           AND status IN ('pending', 'confirmed')
           AND check_in < ?3
           AND ?2 < check_out
         LIMIT 1",
        params![
            property_id,
            check_in.format("%Y-%m-%d").to_string(),
            check_out.format("%Y-%m-%d").to_string(),
        ],
        |row| row.get(0),
    );

    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

pub fn get_active_reservations_for_property(
    conn: &Connection,
    property_id: &str,
) -> anyhow::Result<Vec<Reservation>> {
    let sql = format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations
         WHERE property_id = ?1 AND status IN ('pending', 'confirmed')
         ORDER BY check_in ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![property_id], |row| Ok(parse_reservation_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

pub fn list_reservations_for_guest(
    conn: &Connection,
    guest_id: &str,
) -> anyhow::Result<Vec<Reservation>> {
    let sql = format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations
         WHERE guest_id = ?1 ORDER BY check_in ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![guest_id], |row| Ok(parse_reservation_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

pub fn list_reservations_for_host(
    conn: &Connection,
    host_id: &str,
) -> anyhow::Result<Vec<Reservation>> {
    let sql = format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations
         WHERE host_id = ?1 ORDER BY check_in ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![host_id], |row| Ok(parse_reservation_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

pub fn get_all_reservations(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Reservation>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations
                 WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations
                 ORDER BY created_at DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_reservation_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

pub fn update_reservation_status(
    conn: &Connection,
    id: &str,
    status: ReservationStatus,
    cancellation: Option<&CancellationRecord>,
) -> anyhow::Result<bool> {
    let now = chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let count = match cancellation {
        Some(record) => conn.execute(
            "UPDATE reservations
             SET status = ?1, cancelled_by = ?2, cancelled_at = ?3, cancellation_reason = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                status.as_str(),
                record.cancelled_by,
                record.cancelled_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                record.reason,
                now,
                id,
            ],
        )?,
        None => conn.execute(
            "UPDATE reservations SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now, id],
        )?,
    };
    Ok(count > 0)
}

pub fn update_payment_record(
    conn: &Connection,
    id: &str,
    payment: &PaymentRecord,
) -> anyhow::Result<bool> {
    let now = chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let count = conn.execute(
        "UPDATE reservations
         SET payment_order_id = ?1, payment_status = ?2, payment_updated_at = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            payment.order_id,
            payment.status.as_str(),
            payment.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            now,
            id,
        ],
    )?;
    Ok(count > 0)
}

fn parse_reservation_row(row: &rusqlite::Row) -> anyhow::Result<Reservation> {
    let check_in_str: String = row.get(4)?;
    let check_out_str: String = row.get(5)?;
    let status_str: String = row.get(9)?;
    let created_at_str: String = row.get(25)?;
    let updated_at_str: String = row.get(26)?;

    let status = ReservationStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("unknown reservation status: {status_str}"))?;

    let payment = {
        let order_id: Option<String> = row.get(19)?;
        let payment_status_str: Option<String> = row.get(20)?;
        let payment_updated_at_str: Option<String> = row.get(21)?;
        match (order_id, payment_status_str, payment_updated_at_str) {
            (Some(order_id), Some(status_str), Some(updated_at_str)) => {
                let status = PaymentStatus::parse(&status_str)
                    .ok_or_else(|| anyhow::anyhow!("unknown payment status: {status_str}"))?;
                Some(PaymentRecord {
                    order_id,
                    status,
                    updated_at: NaiveDateTime::parse_from_str(
                        &updated_at_str,
                        "%Y-%m-%d %H:%M:%S",
                    )?,
                })
            }
            _ => None,
        }
    };

    let cancellation = {
        let cancelled_by: Option<String> = row.get(22)?;
        let cancelled_at_str: Option<String> = row.get(23)?;
        match (cancelled_by, cancelled_at_str) {
            (Some(cancelled_by), Some(cancelled_at_str)) => Some(CancellationRecord {
                cancelled_by,
                cancelled_at: NaiveDateTime::parse_from_str(
                    &cancelled_at_str,
                    "%Y-%m-%d %H:%M:%S",
                )?,
                reason: row.get(24)?,
            }),
            _ => None,
        }
    };

    Ok(Reservation {
        id: row.get(0)?,
        property_id: row.get(1)?,
        guest_id: row.get(2)?,
        host_id: row.get(3)?,
        check_in: NaiveDate::parse_from_str(&check_in_str, "%Y-%m-%d")?,
        check_out: NaiveDate::parse_from_str(&check_out_str, "%Y-%m-%d")?,
        guests: GuestCounts {
            adults: row.get(6)?,
            children: row.get(7)?,
            infants: row.get(8)?,
        },
        status,
        special_requests: row.get(10)?,
        pricing: PricingSnapshot {
            base_price: row.get(11)?,
            nights: row.get(12)?,
            subtotal: row.get(13)?,
            cleaning_fee: row.get(14)?,
            service_fee: row.get(15)?,
            taxes: row.get(16)?,
            total: row.get(17)?,
            currency: row.get(18)?,
        },
        payment,
        cancellation,
        created_at: NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")?,
        updated_at: NaiveDateTime::parse_from_str(&updated_at_str, "%Y-%m-%d %H:%M:%S")?,
    })
}

// ── Reviews ──

pub fn create_review(conn: &Connection, review: &Review) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reviews (id, property_id, reservation_id, guest_id, rating, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            review.id,
            review.property_id,
            review.reservation_id,
            review.guest_id,
            review.rating,
            review.comment,
            review.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_review_for_reservation(
    conn: &Connection,
    reservation_id: &str,
) -> anyhow::Result<Option<Review>> {
    let result = conn.query_row(
        "SELECT id, property_id, reservation_id, guest_id, rating, comment, created_at
         FROM reviews WHERE reservation_id = ?1",
        params![reservation_id],
        |row| Ok(parse_review_row(row)),
    );

    match result {
        Ok(review) => Ok(Some(review?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_reviews_for_property(
    conn: &Connection,
    property_id: &str,
) -> anyhow::Result<Vec<Review>> {
    let mut stmt = conn.prepare(
        "SELECT id, property_id, reservation_id, guest_id, rating, comment, created_at
         FROM reviews WHERE property_id = ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![property_id], |row| Ok(parse_review_row(row)))?;

    let mut reviews = vec![];
    for row in rows {
        reviews.push(row??);
    }
    Ok(reviews)
}

pub fn average_rating(conn: &Connection, property_id: &str) -> anyhow::Result<Option<f64>> {
    let avg: Option<f64> = conn.query_row(
        "SELECT AVG(rating) FROM reviews WHERE property_id = ?1",
        params![property_id],
        |row| row.get(0),
    )?;
    Ok(avg)
}

fn parse_review_row(row: &rusqlite::Row) -> anyhow::Result<Review> {
    let created_at_str: String = row.get(6)?;
    Ok(Review {
        id: row.get(0)?,
        property_id: row.get(1)?,
        reservation_id: row.get(2)?,
        guest_id: row.get(3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        created_at: NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")?,
    })
}

// ── Dashboard ──

pub struct DashboardStats {
    pub active_properties: i64,
    pub pending_reservations: i64,
    pub confirmed_reservations: i64,
    pub upcoming_check_ins: i64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let today = chrono::Utc::now()
        .date_naive()
        .format("%Y-%m-%d")
        .to_string();

    let active_properties: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM properties WHERE is_active = 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let pending_reservations: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reservations WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let confirmed_reservations: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reservations WHERE status = 'confirmed'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let upcoming_check_ins: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reservations WHERE status = 'confirmed' AND check_in >= ?1",
            params![today],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(DashboardStats {
        active_properties,
        pending_reservations,
        confirmed_reservations,
        upcoming_check_ins,
    })
}
