//! Read-side queries over `pricing_history`.
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSummary {
    pub machine_type: String,
    pub region_name: String,
    pub min_hour_spot_price: f64,
    pub max_hour_spot_price: f64,
    /// Spot price from the most recent snapshot.
    pub hour_spot_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineDetail {
    pub machine_type: String,
    pub region_name: String,
    pub min_hour_spot_price: f64,
    pub max_hour_spot_price: f64,
    pub hour_spot_price: f64,
    pub spot_hour_price_history: Vec<PricePoint>,
}

pub fn total_records(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM pricing_history", [], |row| row.get(0))
}

pub fn all_regions(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT region_name FROM pricing_history ORDER BY region_name")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let regions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(regions)
}

pub fn machines_by_region(
    conn: &Connection,
    region_name: &str,
) -> rusqlite::Result<Vec<MachineSummary>> {
    let mut stmt = conn.prepare(
        r#"
SELECT
    p.machine_type,
    MIN(p.spot_hour_price),
    MAX(p.spot_hour_price),
    (SELECT l.spot_hour_price
       FROM pricing_history l
      WHERE l.region_name = ?1 AND l.machine_type = p.machine_type
      ORDER BY l.updated_ts DESC
      LIMIT 1)
FROM pricing_history p
WHERE p.region_name = ?1
GROUP BY p.machine_type
ORDER BY p.machine_type DESC"#,
    )?;
    let rows = stmt.query_map(params![region_name], |row| {
        Ok(MachineSummary {
            machine_type: row.get(0)?,
            region_name: region_name.to_string(),
            min_hour_spot_price: row.get(1)?,
            max_hour_spot_price: row.get(2)?,
            hour_spot_price: row.get(3)?,
        })
    })?;
    let machines = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(machines)
}

/// Full spot price series for one region/machine pair, or `None` if the pair
/// has never been ingested.
pub fn machine_detail(
    conn: &Connection,
    region_name: &str,
    machine_type: &str,
) -> rusqlite::Result<Option<MachineDetail>> {
    let mut stmt = conn.prepare(
        "SELECT spot_hour_price, updated_ts FROM pricing_history \
         WHERE region_name = ?1 AND machine_type = ?2 ORDER BY updated_ts ASC",
    )?;
    let rows = stmt.query_map(params![region_name, machine_type], |row| {
        let price: f64 = row.get(0)?;
        let ts: i64 = row.get(1)?;
        Ok((price, ts))
    })?;

    let mut history = Vec::new();
    for row in rows {
        let (price, ts) = row?;
        let Some(timestamp) = DateTime::<Utc>::from_timestamp(ts, 0) else {
            continue;
        };
        history.push(PricePoint { price, timestamp });
    }

    let Some(latest) = history.last() else {
        return Ok(None);
    };
    let hour_spot_price = latest.price;
    let (min, max) = history.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.price), hi.max(p.price))
    });

    Ok(Some(MachineDetail {
        machine_type: machine_type.to_string(),
        region_name: region_name.to_string(),
        min_hour_spot_price: min,
        max_hour_spot_price: max,
        hour_spot_price,
        spot_hour_price_history: history,
    }))
}
