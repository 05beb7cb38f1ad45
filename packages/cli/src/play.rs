//! Headless playback on the real ticker.

use chrono::{FixedOffset, NaiveDate};
use drone_map_cli_utils::{MultiProgress, PlaybackBar};
use drone_map_dashboard::record::calendar_day_of_ms;
use drone_map_dashboard::ticker::PlaybackTicker;
use drone_map_dashboard::{Dashboard, TickOutcome};

/// Plays the active window until playback stops, `max_ticks` ticks have
/// run, or Ctrl-C is pressed. A playback bar follows the playhead through
/// the window, and the visible flight count is logged each time the
/// playhead enters a new day.
///
/// # Errors
///
/// Returns an error if the Ctrl-C handler cannot be installed.
pub async fn run(
    multi: &MultiProgress,
    dashboard: &mut Dashboard,
    max_ticks: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !dashboard.play() {
        log::warn!("Nothing to play: the window is empty or a single instant");
        return Ok(());
    }

    let offset = dashboard.config().utc_offset();
    let bar = PlaybackBar::start(multi, &window_label(dashboard, offset));
    let mut ticker = PlaybackTicker::new(dashboard.config().tick_interval());
    ticker.sync(dashboard.is_playing());

    let mut current_day: Option<NaiveDate> = None;
    let mut ticks: u64 = 0;
    report_day(dashboard, offset, &bar, &mut current_day);

    loop {
        tokio::select! {
            ticked = ticker.next_tick() => {
                if !ticked {
                    break;
                }
                ticks += 1;
                match dashboard.tick() {
                    TickOutcome::Wrapped => log::info!("Looped back to window start"),
                    TickOutcome::Finished => log::info!("Reached end of window"),
                    TickOutcome::Advanced | TickOutcome::Idle => {}
                }
                report_day(dashboard, offset, &bar, &mut current_day);

                if max_ticks.is_some_and(|max| ticks >= max) {
                    log::info!("Tick limit reached");
                    dashboard.pause();
                }
                ticker.sync(dashboard.is_playing());
                if !dashboard.is_playing() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                log::info!("Interrupted");
                dashboard.pause();
                break;
            }
        }
    }

    ticker.stop();
    bar.finish(ticks);
    log::info!(
        "Playback stopped after {ticks} ticks at {:.1}% of the window",
        dashboard.window_progress()
    );
    Ok(())
}

/// `"<first day> to <last day>"` of the active window.
fn window_label(dashboard: &Dashboard, offset: Option<FixedOffset>) -> String {
    dashboard.range().map_or_else(String::new, |range| {
        let first = calendar_day_of_ms(range.start(), offset);
        let last = calendar_day_of_ms(range.end(), offset);
        format!("{first} to {last}")
    })
}

fn report_day(
    dashboard: &Dashboard,
    offset: Option<FixedOffset>,
    bar: &PlaybackBar,
    current_day: &mut Option<NaiveDate>,
) {
    let day = calendar_day_of_ms(dashboard.position(), offset);
    let visible = dashboard.visible_records().len();
    bar.update(dashboard.window_progress(), day, visible);

    if *current_day != Some(day) {
        *current_day = Some(day);
        log::debug!(
            "{day}: {visible} flights visible ({} in window)",
            dashboard.filtered_records().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Utc};
    use drone_map_dashboard::DashboardConfig;
    use drone_map_flight_models::FlightRecord;

    fn flight(day: u32) -> FlightRecord {
        FlightRecord {
            date: Utc.with_ymd_and_hms(2023, 3, day, 12, 0, 0).unwrap(),
            case_number: format!("23-{day:03}"),
            duration: None,
            reason: "Welfare check".to_string(),
            location: "276 FOURTH AVE".to_string(),
            coordinates: Some([-117.08, 32.64]),
            neighborhood: None,
            district: None,
        }
    }

    #[test]
    fn window_label_spans_calendar_days() {
        let config = DashboardConfig {
            utc_offset_minutes: Some(0),
            ..DashboardConfig::default()
        };
        let dashboard = Dashboard::with_records(config, vec![flight(2), flight(9)]);
        let offset = dashboard.config().utc_offset();
        assert_eq!(window_label(&dashboard, offset), "2023-03-02 to 2023-03-09");

        let empty = Dashboard::new(DashboardConfig::default());
        assert_eq!(window_label(&empty, None), "");
    }
}
