//! 日期时间与时长解析
//!
//! 日期时间先按区域设置解析（数字日期的年月日顺序由区域决定），
//! 再尝试英文月份名（`June 1, 2019`、`1 Jun 2019`），最后尝试
//! RFC 3339 / ISO 8601 往返格式。偏移量只能跟在时间之后，
//! 未带偏移量的时间按 UTC 处理。月份名只识别英文。
//!
//! 时长以 `P` 开头时按受限的 ISO 8601 语法解析（只支持天、时、分、秒），
//! 否则按 `[-][d.]h:mm[:ss[.fffffff]]` 形式的经过时间字面量解析。

use crate::error::CoercionError;
use crate::operators::FieldType;
use crate::options::{DateOrder, Locale};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static LOCAL_DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^\s*
        (?P<a>\d{1,4})[/.\-](?P<b>\d{1,2})[/.\-](?P<c>\d{1,4})
        (?:
            (?:T|\s+)
            (?P<hour>\d{1,2}):(?P<minute>\d{2})
            (?::(?P<second>\d{2})(?:[.,](?P<fraction>\d{1,9}))?)?
            \s*(?P<ampm>AM|PM)?
            \s*(?P<offset>Z|[+\-]\d{1,2}(?::?\d{2})?)?
        )?
        \s*$",
    )
    .expect("日期时间正则表达式无效")
});

/// 月份名日期格式，`%B` 解析时同时接受全称与缩写
const MONTH_NAME_FORMATS: [&str; 4] = ["%B %d, %Y", "%B %d %Y", "%d %B %Y", "%A, %B %d, %Y"];

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^P(?:(?P<days>\d+)D)?(?P<time>T(?:(?P<hours>\d+)H)?(?:(?P<minutes>\d+)M)?(?:(?P<seconds>\d+)S)?)?$",
    )
    .expect("ISO 时长正则表达式无效")
});

static YEAR_MONTH_DESIGNATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^P[^T]*\d[YM]").expect("ISO 时长正则表达式无效"));

static ELAPSED_DOT: Lazy<Regex> = Lazy::new(|| elapsed_regex(r"\."));

static ELAPSED_COMMA: Lazy<Regex> = Lazy::new(|| elapsed_regex(r"[.,]"));

static DAY_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?P<sign>-)?(?P<days>\d+)\s*$").expect("天数正则表达式无效"));

fn elapsed_regex(fraction_separator: &str) -> Regex {
    Regex::new(&format!(
        r"^\s*(?P<sign>-)?(?:(?P<days>\d+)\.)?(?P<hours>\d{{1,2}}):(?P<minutes>\d{{1,2}})(?::(?P<seconds>\d{{1,2}})(?:{fraction_separator}(?P<fraction>\d{{1,7}}))?)?\s*$"
    ))
    .expect("经过时间正则表达式无效")
}

/// 解析日期 + 时间 + 偏移量
pub fn parse_datetime(text: &str, locale: &Locale) -> Result<DateTime<FixedOffset>, CoercionError> {
    let trimmed = text.trim();
    if let Some(dt) = parse_locale_datetime(trimmed, locale) {
        return Ok(dt);
    }
    if let Some(dt) = parse_month_name_date(trimmed) {
        return Ok(dt);
    }
    parse_roundtrip_datetime(trimmed)
        .ok_or_else(|| CoercionError::invalid(FieldType::DateTime, text))
}

/// 解析为日期，丢弃时间与偏移量
pub fn parse_date(text: &str, locale: &Locale) -> Result<NaiveDate, CoercionError> {
    parse_datetime(text, locale)
        .map(|dt| dt.date_naive())
        .map_err(|_| CoercionError::invalid(FieldType::Date, text))
}

fn parse_locale_datetime(text: &str, locale: &Locale) -> Option<DateTime<FixedOffset>> {
    let caps = LOCAL_DATETIME.captures(text)?;
    let a = &caps["a"];
    let b: u32 = caps["b"].parse().ok()?;
    let c = &caps["c"];

    // 四位数开头一律视为 年-月-日
    let (year, month, day) = if a.len() == 4 {
        (a.parse().ok()?, b, c.parse().ok()?)
    } else {
        match locale.date_order() {
            DateOrder::MonthDayYear => (expand_year(c)?, a.parse().ok()?, b),
            DateOrder::DayMonthYear => (expand_year(c)?, b, a.parse().ok()?),
            DateOrder::YearMonthDay => (expand_year(a)?, b, c.parse().ok()?),
        }
    };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = match caps.name("hour") {
        Some(hour) => local_time(hour.as_str(), &caps)?,
        None => NaiveTime::MIN,
    };

    let offset = match caps.name("offset") {
        Some(m) => parse_offset(m.as_str())?,
        None => FixedOffset::east_opt(0)?,
    };

    NaiveDateTime::new(date, time)
        .and_local_timezone(offset)
        .single()
}

fn parse_month_name_date(text: &str) -> Option<DateTime<FixedOffset>> {
    MONTH_NAME_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
}

fn local_time(hour: &str, caps: &Captures<'_>) -> Option<NaiveTime> {
    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = caps["minute"].parse().ok()?;
    let second: u32 = match caps.name("second") {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };
    let nanos = match caps.name("fraction") {
        Some(f) => fraction_nanos(f.as_str(), 9)?,
        None => 0,
    };

    if let Some(ampm) = caps.name("ampm") {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = ampm.as_str().eq_ignore_ascii_case("pm");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

fn expand_year(text: &str) -> Option<i32> {
    let year: i32 = text.parse().ok()?;
    Some(match (text.len(), year) {
        (1 | 2, y) if y < 50 => 2000 + y,
        (1 | 2, y) => 1900 + y,
        (_, y) => y,
    })
}

/// `Z`、`+05:30`、`-1:00`、`+0530`、`+05`
fn parse_offset(text: &str) -> Option<FixedOffset> {
    if text.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match text.split_at(1) {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() > 2 => rest.split_at(rest.len() - 2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_roundtrip_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

/// 解析时长
pub fn parse_duration(text: &str, locale: &Locale) -> Result<TimeDelta, CoercionError> {
    let trimmed = text.trim();
    if trimmed.starts_with(['P', 'p']) {
        parse_iso_duration(trimmed)
    } else {
        parse_elapsed(trimmed, locale)
    }
}

fn parse_iso_duration(text: &str) -> Result<TimeDelta, CoercionError> {
    if YEAR_MONTH_DESIGNATOR.is_match(text) {
        return Err(CoercionError::UnsupportedDesignator(text.to_string()));
    }

    let invalid = || CoercionError::invalid(FieldType::Duration, text);
    let caps = ISO_DURATION.captures(text).ok_or_else(invalid)?;

    let has_time_component = ["hours", "minutes", "seconds"]
        .iter()
        .any(|name| caps.name(name).is_some());
    if caps.name("time").is_some() && !has_time_component {
        return Err(invalid());
    }
    if caps.name("days").is_none() && !has_time_component {
        return Err(invalid());
    }

    let component = |name: &str| -> Result<i64, CoercionError> {
        match caps.name(name) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| CoercionError::OutOfRange(m.as_str().to_string())),
            None => Ok(0),
        }
    };

    build_duration(
        false,
        component("days")?,
        component("hours")?,
        component("minutes")?,
        component("seconds")?,
        0,
    )
    .ok_or_else(|| CoercionError::OutOfRange(text.to_string()))
}

fn parse_elapsed(text: &str, locale: &Locale) -> Result<TimeDelta, CoercionError> {
    let invalid = || CoercionError::invalid(FieldType::Duration, text);

    if let Some(caps) = DAY_COUNT.captures(text) {
        let days: i64 = caps["days"]
            .parse()
            .map_err(|_| CoercionError::OutOfRange(text.to_string()))?;
        return build_duration(caps.name("sign").is_some(), days, 0, 0, 0, 0)
            .ok_or_else(|| CoercionError::OutOfRange(text.to_string()));
    }

    let pattern = if locale.decimal_separator() == ',' {
        &*ELAPSED_COMMA
    } else {
        &*ELAPSED_DOT
    };
    let caps = pattern.captures(text).ok_or_else(invalid)?;

    let number = |name: &str| -> Option<i64> {
        caps.name(name).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    let days = number("days").ok_or_else(invalid)?;
    let hours = number("hours").ok_or_else(invalid)?;
    let minutes = number("minutes").ok_or_else(invalid)?;
    let seconds = number("seconds").ok_or_else(invalid)?;
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(invalid());
    }
    let nanos = match caps.name("fraction") {
        Some(f) => fraction_nanos(f.as_str(), 7).ok_or_else(invalid)?,
        None => 0,
    };

    build_duration(
        caps.name("sign").is_some(),
        days,
        hours,
        minutes,
        seconds,
        i64::from(nanos),
    )
    .ok_or_else(|| CoercionError::OutOfRange(text.to_string()))
}

/// 小数部分转纳秒，`max_digits` 为允许的最大位数
fn fraction_nanos(digits: &str, max_digits: usize) -> Option<u32> {
    if digits.is_empty() || digits.len() > max_digits {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    Some(value * 10u32.pow(9 - digits.len() as u32))
}

fn build_duration(
    negative: bool,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
    nanos: i64,
) -> Option<TimeDelta> {
    let total = TimeDelta::try_days(days)?
        .checked_add(&TimeDelta::try_hours(hours)?)?
        .checked_add(&TimeDelta::try_minutes(minutes)?)?
        .checked_add(&TimeDelta::try_seconds(seconds)?)?
        .checked_add(&TimeDelta::nanoseconds(nanos))?;
    Some(if negative { -total } else { total })
}

/// 日期时间类型的默认值（0001-01-01T00:00:00Z）
pub fn min_datetime() -> DateTime<FixedOffset> {
    min_date()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .fixed_offset()
}

/// 日期类型的默认值（0001-01-01）
pub fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}
