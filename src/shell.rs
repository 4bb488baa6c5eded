//! Line-oriented interactive session for one batch at a time
//!
//! Every line is one synchronous step against the in-memory [`Session`].
//! Operator mistakes are reported and leave the state untouched; only
//! database failures end the loop.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime, Utc};

use crate::batch::Session;
use crate::config::Config;
use crate::db;
use crate::models::Round;
use crate::report;

const HELP: &str = "\
Commands:
  id <text>                          set batch id
  date <YYYY-MM-DD>                  set batch date
  operator <name>                    set operator (required to save)
  beverage <text>                    set beverage type
  vessel <n> <label>                 rename extraction vessel n (1-6)
  reducer <n> <label>                rename concentration vessel n (1-2)
  reading <round> <vessel> <litres>  record a reading (round 1-3)
  window <round> <vessel> <HH:MM> <HH:MM>
                                     record start/end of a cooking
  transfer <reducer> <litres>        log a transfer
  clear-transfers                    empty the transfer log
  final <litres>                     set final reduced volume
  timer <label> <minutes>            start a countdown
  dismiss <label>                    remove a countdown
  timers                             show countdowns
  status                             show totals and yield
  save                               finalize and store the batch
  report | label                     render the current batch
  reset                              start a new batch
  quit";

/// What the loop should do after a command
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    session: Session,
    config: Config,
    db_path: PathBuf,
}

impl Shell {
    pub fn new(config: Config, db_path: &Path) -> Self {
        Self {
            session: Session::new(&config, Local::now()),
            config,
            db_path: db_path.to_path_buf(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        writeln!(out, "Batch {} - type 'help' for commands", self.session.meta.id)?;
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if self.execute(line, &mut out)? == Flow::Quit {
                break;
            }
            for label in self.session.timers.expired(Utc::now()) {
                writeln!(out, "ALERT: timer for {} has expired (dismiss {})", label, label)?;
            }
        }
        out.flush()?;
        Ok(())
    }

    fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        match (cmd, args.as_slice()) {
            ("help", _) => writeln!(out, "{}", HELP)?,
            ("quit" | "exit", _) => return Ok(Flow::Quit),

            ("id", [_, ..]) => {
                self.session.meta.id = rest.to_string();
                writeln!(out, "batch id: {}", rest)?;
            }
            ("date", [date]) => match date.parse::<NaiveDate>() {
                Ok(d) => {
                    self.session.meta.created_on = d;
                    writeln!(out, "date: {}", d)?;
                }
                Err(_) => writeln!(out, "invalid date '{}', expected YYYY-MM-DD", date)?,
            },
            ("operator", _) => {
                self.session.meta.operator = rest.to_string();
                writeln!(out, "operator: {}", rest)?;
            }
            ("beverage", _) => {
                self.session.meta.beverage = rest.to_string();
                writeln!(out, "beverage: {}", rest)?;
            }

            ("vessel" | "reducer", [n, _, ..]) => {
                let label = rest[n.len()..].trim();
                let slot = n.parse::<usize>().ok().filter(|n| *n >= 1);
                let set = if cmd == "vessel" {
                    &mut self.session.vessels
                } else {
                    &mut self.session.reducers
                };
                match slot.map(|s| set.rename(s - 1, label)) {
                    Some(Ok(())) => writeln!(out, "{} {} is now {}", cmd, n, label)?,
                    Some(Err(e)) => writeln!(out, "{}", e)?,
                    None => writeln!(out, "invalid {} number '{}'", cmd, n)?,
                }
            }

            ("reading", [round, vessel, litres]) => {
                let Some((round, vessel)) = self.slot(round, vessel, out)? else {
                    return Ok(Flow::Continue);
                };
                let recorded = litres
                    .parse::<f64>()
                    .map(|v| self.session.ledger.record_reading(round, vessel, v))
                    .unwrap_or(false);
                if recorded {
                    writeln!(
                        out,
                        "round {} total: {:.1} L",
                        round.number(),
                        self.session.ledger.round_total(round)
                    )?;
                } else {
                    writeln!(out, "volume must be a number >= 0")?;
                }
            }
            ("window", [round, vessel, start, end]) => {
                let Some((round, vessel)) = self.slot(round, vessel, out)? else {
                    return Ok(Flow::Continue);
                };
                match (parse_time(start), parse_time(end)) {
                    (Some(s), Some(e)) => match self.session.set_window(round, vessel, s, e) {
                        Ok(()) => writeln!(out, "window recorded: {} min", (e - s).num_minutes())?,
                        Err(err) => writeln!(out, "{}", err)?,
                    },
                    _ => writeln!(out, "times must be HH:MM")?,
                }
            }

            ("transfer", [_, .., litres]) => {
                let target = rest[..rest.len() - litres.len()].trim();
                let Ok(quantity) = litres.parse::<f64>() else {
                    writeln!(out, "quantity must be a number")?;
                    return Ok(Flow::Continue);
                };
                match self.session.transfer(target, quantity, Utc::now()) {
                    Ok(true) => {
                        let summary = self.session.summary();
                        writeln!(
                            out,
                            "{}: {:.1} L, total transferred {:.1} L, {}",
                            target,
                            self.session.transfers.total_for(target),
                            summary.transfer_total,
                            summary.balance
                        )?;
                    }
                    Ok(false) => writeln!(out, "quantity must be greater than zero")?,
                    Err(e) => writeln!(out, "{}", e)?,
                }
            }
            ("clear-transfers", []) => {
                self.session.transfers.clear();
                log::info!("batch {}: transfer log cleared", self.session.meta.id);
                writeln!(out, "transfer log cleared")?;
            }
            ("final", [litres]) => match litres.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => {
                    self.session.final_volume = v;
                    let result = self.session.summary().yield_result;
                    writeln!(out, "yield {:.1}%: {}", result.percentage, result.status.describe())?;
                }
                _ => writeln!(out, "volume must be a number >= 0")?,
            },

            ("timer", [_, .., minutes]) => {
                let label = rest[..rest.len() - minutes.len()].trim();
                let started = minutes
                    .parse::<u32>()
                    .map(|m| self.session.timers.start(label, m, Utc::now()))
                    .unwrap_or(false);
                if started {
                    writeln!(out, "timer started for {} ({} min)", label, minutes)?;
                } else {
                    writeln!(out, "minutes must be a whole number >= 1")?;
                }
            }
            ("dismiss", [_, ..]) => {
                self.session.timers.dismiss(rest);
                writeln!(out, "timer for {} dismissed", rest)?;
            }
            ("timers", []) => {
                let remaining = self.session.timers.tick(Utc::now());
                if remaining.is_empty() {
                    writeln!(out, "no timers running")?;
                }
                for (label, secs) in remaining {
                    if secs <= 0 {
                        writeln!(out, "  {}: EXPIRED", label)?;
                    } else {
                        writeln!(out, "  {}: {:02}:{:02} left", label, secs / 60, secs % 60)?;
                    }
                }
            }

            ("status", []) => write!(out, "{}", self.session.summary())?,
            ("save", []) => self.save(out)?,
            ("report", []) => match self.session.finalize() {
                Ok(record) => write!(out, "{}", report::format_report(&record))?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            ("label", []) => match self.session.finalize() {
                Ok(record) => write!(out, "{}", report::format_label(&record))?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            ("reset", []) => {
                self.session.reset(&self.config, Local::now());
                writeln!(out, "new batch {}", self.session.meta.id)?;
            }

            _ => writeln!(out, "unrecognised command '{}', try 'help'", line)?,
        }

        Ok(Flow::Continue)
    }

    fn slot<W: Write>(
        &self,
        round: &str,
        vessel: &str,
        out: &mut W,
    ) -> Result<Option<(Round, usize)>> {
        let Some(round) = round.parse::<usize>().ok().and_then(Round::from_number) else {
            writeln!(out, "round must be 1, 2 or 3")?;
            return Ok(None);
        };
        let Some(vessel) = self.session.vessel_index(vessel) else {
            writeln!(out, "unknown vessel '{}'", vessel)?;
            return Ok(None);
        };
        Ok(Some((round, vessel)))
    }

    fn save<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let record = match self.session.finalize() {
            Ok(record) => record,
            Err(e) => {
                writeln!(out, "not saved: {}", e)?;
                return Ok(());
            }
        };

        let balance = self.session.summary().balance;
        if balance.is_error() {
            writeln!(out, "warning: {}", balance)?;
        }

        let conn = db::open(&self.db_path)?;
        db::upsert_batch(&conn, &record)?;
        log::info!(
            "saved batch {} ({:.1}%, {})",
            record.id,
            record.percentage,
            record.status
        );
        writeln!(out, "batch {} saved ({})", record.id, record.status)?;
        Ok(())
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(shell: &mut Shell, script: &str) -> String {
        let mut out = Vec::new();
        shell.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn shell() -> (tempfile::TempDir, Shell) {
        let dir = tempfile::tempdir().unwrap();
        let shell = Shell::new(Config::default(), &dir.path().join("test.db"));
        (dir, shell)
    }

    #[test]
    fn readings_update_round_totals() {
        let (_dir, mut sh) = shell();
        let out = run(&mut sh, "reading 1 2 25\nreading 1 P3 -4\nreading 4 1 3\n");
        assert!(out.contains("round 1 total: 175.0 L"));
        assert!(out.contains("volume must be a number >= 0"));
        assert!(out.contains("round must be 1, 2 or 3"));
        assert_eq!(sh.session().ledger.batch_total(), 385.0);
    }

    #[test]
    fn renamed_reducer_accepts_multi_word_transfers() {
        let (_dir, mut sh) = shell();
        let out = run(
            &mut sh,
            "reducer 1 Big Pan\ntransfer Big Pan 100\ntransfer Tacho 1 5\ntransfer Big Pan 0\n",
        );
        assert!(out.contains("reducer 1 is now Big Pan"));
        assert!(out.contains("Big Pan: 100.0 L"));
        assert!(out.contains("'Tacho 1' is not a concentration vessel"));
        assert!(out.contains("quantity must be greater than zero"));
        assert_eq!(sh.session().transfers.len(), 1);
    }

    #[test]
    fn numeric_vessel_names_are_refused() {
        let (_dir, mut sh) = shell();
        let out = run(&mut sh, "vessel 5 2\nreading 1 2 10\n");
        assert!(out.contains("label '2' would be read as a slot number"));
        assert_eq!(sh.session().ledger.reading(Round::First, 1), 10.0);
        assert_eq!(sh.session().ledger.reading(Round::First, 4), 30.0);
        assert_eq!(sh.session().vessels.get(4).unwrap().as_str(), "P5");
    }

    #[test]
    fn pending_explains_both_volumes() {
        let (_dir, mut sh) = shell();
        let mut script = String::new();
        for round in 1..=3 {
            for vessel in 1..=6 {
                script.push_str(&format!("reading {} {} 0\n", round, vessel));
            }
        }
        script.push_str("final 50\n");
        let out = run(&mut sh, &script);
        assert!(out.contains(
            "yield 0.0%: pending (extracted and final volumes must both be positive)"
        ));
    }

    #[test]
    fn window_rejects_reversed_times() {
        let (_dir, mut sh) = shell();
        let out = run(&mut sh, "window 1 1 08:00 09:15\nwindow 1 2 10:00 09:00\n");
        assert!(out.contains("window recorded: 75 min"));
        assert!(out.contains("before it starts"));
    }

    #[test]
    fn timers_start_and_dismiss() {
        let (_dir, mut sh) = shell();
        let out = run(&mut sh, "timer P1 0\ntimer P1 10\ntimers\ndismiss P1\ntimers\n");
        assert!(out.contains("minutes must be a whole number >= 1"));
        assert!(out.contains("timer started for P1 (10 min)"));
        assert!(out.contains("P1: 09:5") || out.contains("P1: 10:00"));
        assert!(out.contains("no timers running"));
    }

    #[test]
    fn quit_stops_processing() {
        let (_dir, mut sh) = shell();
        run(&mut sh, "final 90\nquit\nfinal 10\n");
        assert_eq!(sh.session().final_volume, 90.0);
    }
}
