//! Unit Tests for gym hours and local calendar arithmetic

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::America::{Mexico_City, Sao_Paulo};

use gym_desk::config::Config;
use gym_desk::services::timezone_service::parse_timezone;
use gym_desk::services::GymSchedule;

fn hm(hour: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, min, 0).unwrap()
}

#[test]
fn test_configured_hours_drive_the_schedule() {
    let config = Config {
        opening_time: hm(7, 30),
        closing_time: hm(21, 0),
        ..Config::default()
    };
    assert!(config.validate().is_ok());

    let schedule = GymSchedule::new(config.gym_timezone(), config.opening_time, config.closing_time);
    let at = |h, m| {
        Mexico_City
            .with_ymd_and_hms(2025, 6, 2, h, m, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    };
    assert!(!schedule.is_open(at(7, 29)));
    assert!(schedule.is_open(at(7, 30)));
    assert!(schedule.is_open(at(21, 0)));
    assert!(!schedule.is_open(at(21, 1)));
}

#[test]
fn test_inverted_hours_are_rejected() {
    let config = Config {
        opening_time: hm(22, 0),
        closing_time: hm(6, 0),
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_local_day_differs_from_utc_day() {
    let schedule = GymSchedule::new(Mexico_City, hm(6, 0), hm(22, 0));

    // 21:30 local on 2 June is 03:30 UTC on 3 June
    let late = Utc.with_ymd_and_hms(2025, 6, 3, 3, 30, 0).single().unwrap();
    assert_eq!(schedule.local_date(late), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    assert_eq!(
        schedule.local_day_start(late),
        Utc.with_ymd_and_hms(2025, 6, 2, 6, 0, 0).single().unwrap()
    );
}

#[test]
fn test_day_starting_in_a_dst_gap() {
    // Sao Paulo skipped from 00:00 to 01:00 on 4 November 2018
    let schedule = GymSchedule::new(Sao_Paulo, hm(6, 0), hm(22, 0));
    let gap_day = NaiveDate::from_ymd_opt(2018, 11, 4).unwrap();
    assert_eq!(
        schedule.start_of_local_date(gap_day),
        Utc.with_ymd_and_hms(2018, 11, 4, 3, 0, 0).single().unwrap()
    );
}

#[test]
fn test_configured_timezone_must_exist() {
    assert!(parse_timezone("America/Mexico_City").is_ok());
    assert!(parse_timezone("Mars/Olympus_Mons").is_err());

    let config = Config {
        timezone: "Mars/Olympus_Mons".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_err());
}
