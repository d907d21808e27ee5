use std::path::PathBuf;

use rstest::rstest;
use weather_summary::{
    format_date, parse_iso_date, summarize_file, SummaryError, WeatherDataset,
};

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

#[test]
fn summarizes_five_days() {
    let summaries = summarize_file(data("example_one.csv")).unwrap();

    assert_eq!(
        summaries.overview,
        "5 Day Overview\n  \
         The lowest temperature will be 9.4°C, and will occur on Friday 02 July 2021.\n  \
         The highest temperature will be 20.0°C, and will occur on Saturday 03 July 2021.\n  \
         The average low this week is 12.2°C.\n  \
         The average high this week is 17.8°C.\n"
    );
    assert_eq!(
        summaries.daily,
        "---- Friday 02 July 2021 ----\n  \
         Minimum Temperature: 9.4°C\n  \
         Maximum Temperature: 19.4°C\n\
         \n\
         ---- Saturday 03 July 2021 ----\n  \
         Minimum Temperature: 13.9°C\n  \
         Maximum Temperature: 20.0°C\n\
         \n\
         ---- Sunday 04 July 2021 ----\n  \
         Minimum Temperature: 13.3°C\n  \
         Maximum Temperature: 16.7°C\n\
         \n\
         ---- Monday 05 July 2021 ----\n  \
         Minimum Temperature: 12.8°C\n  \
         Maximum Temperature: 16.1°C\n\
         \n\
         ---- Tuesday 06 July 2021 ----\n  \
         Minimum Temperature: 11.7°C\n  \
         Maximum Temperature: 16.7°C\n\n"
    );
}

#[test]
fn malformed_rows_do_not_reach_the_statistics() {
    let dataset = WeatherDataset::load(data("messy.csv")).unwrap();
    assert_eq!(dataset.len(), 2);

    let overview = dataset.overview().unwrap();
    assert!(overview.starts_with("2 Day Overview\n"));
    assert!(overview.contains(
        "The lowest temperature will be 7.2°C, and will occur on Friday 09 July 2021."
    ));
    assert!(overview.contains(
        "The highest temperature will be 22.5°C, and will occur on Friday 09 July 2021."
    ));
    assert!(!dataset.daily().unwrap().contains("Thursday 08 July 2021"));
}

#[test]
fn bad_date_aborts_the_summary() {
    let err = summarize_file(data("bad_date.csv")).unwrap_err();
    match err {
        SummaryError::Date(e) => assert_eq!(e.input, "6th of July"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_is_a_load_error() {
    let err = summarize_file(data("nope.csv")).unwrap_err();
    assert!(matches!(err, SummaryError::Load(_)));
}

#[test]
fn header_only_input() {
    let dataset: WeatherDataset = "date,min,max\n".parse().unwrap();
    assert!(dataset.is_empty());
    assert_eq!(dataset.overview().unwrap(), "No data available.");
    assert_eq!(dataset.daily().unwrap(), "\n\n");
}

#[rstest]
#[case("2021-07-06")]
#[case("2000-02-29")]
#[case("1999-01-01")]
#[case("2024-12-25")]
#[case("1970-01-01")]
fn date_layout_matches_strftime(#[case] input: &str) {
    let expected = chrono::NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .unwrap()
        .format("%A %d %B %Y")
        .to_string();
    assert_eq!(format_date(parse_iso_date(input).unwrap()).unwrap(), expected);
}
