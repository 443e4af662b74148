//! Saída de terminal do shift-scheduler: grade colorida de escalas.
//!
//! Usa a crate `console` para estilização. O [`SchedulePrinter`] desenha uma
//! linha por funcionário e uma coluna por dia, agrupando as colunas por
//! semana ISO.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use console::Style;

use crate::schedule::calendar;
use crate::schedule::{Assignment, ShiftKind};

/// Estilos usados na renderização de escalas e relatórios.
pub struct SchedulePrinter {
    // Turno da manhã.
    morning: Style,
    // Turno da noite.
    evening: Style,
    // Folga.
    day_off: Style,
    header: Style,
}

impl Default for SchedulePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulePrinter {
    pub fn new() -> Self {
        Self {
            morning: Style::new().yellow(),
            evening: Style::new().blue().bold(),
            day_off: Style::new().dim(),
            header: Style::new().cyan().bold(),
        }
    }

    fn cell(&self, shift: Option<ShiftKind>) -> String {
        match shift {
            Some(ShiftKind::Morning) => self.morning.apply_to("M").to_string(),
            Some(ShiftKind::Evening) => self.evening.apply_to("E").to_string(),
            Some(ShiftKind::DayOff) => self.day_off.apply_to("-").to_string(),
            None => " ".to_string(),
        }
    }

    /// Monta a grade como texto, sem imprimir.
    ///
    /// Cada célula ocupa duas colunas; semanas são separadas por `|`.
    pub fn render(&self, assignments: &[Assignment]) -> String {
        let mut grid: BTreeMap<&str, BTreeMap<NaiveDate, ShiftKind>> = BTreeMap::new();
        for a in assignments {
            grid.entry(a.staff_id.as_str())
                .or_default()
                .insert(a.date, a.shift);
        }
        let (Some(first), Some(last)) = (
            assignments.iter().map(|a| a.date).min(),
            assignments.iter().map(|a| a.date).max(),
        ) else {
            return String::new();
        };
        let days: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();
        let width = grid.keys().map(|s| s.chars().count()).max().unwrap_or(0);

        let mut out = String::new();
        let mut header = format!("{:width$} ", "");
        for day in &days {
            if calendar::is_week_start(*day) && *day != first {
                header.push_str("| ");
            }
            let initial = day.weekday().to_string().chars().next().unwrap_or('?');
            header.push(initial);
            header.push(' ');
        }
        out.push_str(&self.header.apply_to(header.trim_end()).to_string());
        out.push('\n');

        for (staff, shifts) in &grid {
            let mut line = format!("{staff:width$} ");
            for day in &days {
                if calendar::is_week_start(*day) && *day != first {
                    line.push_str("| ");
                }
                line.push_str(&self.cell(shifts.get(day).copied()));
                line.push(' ');
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    pub fn print_schedule(&self, week_begin: NaiveDate, assignments: &[Assignment]) {
        println!(
            "{} week {} starting {week_begin}",
            self.header.apply_to("Schedule"),
            calendar::iso_week(week_begin).week()
        );
        print!("{}", self.render(assignments));
        println!(
            "{} morning  {} evening  {} day off",
            self.cell(Some(ShiftKind::Morning)),
            self.cell(Some(ShiftKind::Evening)),
            self.cell(Some(ShiftKind::DayOff)),
        );
    }
}
