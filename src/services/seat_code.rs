//! Проверка кодов мест вида `A12` против геометрии зала и вместимости сеанса.
//!
//! Геометрия (буквы рядов и число мест в ряду) приходит из настроек зала,
//! сам валидатор ничего о конкретном зале не знает.

use crate::error::{BookingError, BookingResult};

pub const DEFAULT_ROWS: &str = "ABCDEFGHIJ";
pub const DEFAULT_SEATS_PER_ROW: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatGrid {
    rows: Vec<char>,
    seats_per_row: u32,
}

impl Default for SeatGrid {
    fn default() -> Self {
        SeatGrid::new(DEFAULT_ROWS, DEFAULT_SEATS_PER_ROW)
    }
}

impl SeatGrid {
    pub fn new(rows: &str, seats_per_row: u32) -> Self {
        SeatGrid {
            rows: rows
                .chars()
                .filter(|c| c.is_ascii_alphabetic())
                .map(|c| c.to_ascii_uppercase())
                .collect(),
            seats_per_row,
        }
    }

    pub fn seats_per_row(&self) -> u32 {
        self.seats_per_row
    }

    fn row_index(&self, letter: char) -> Option<usize> {
        let letter = letter.to_ascii_uppercase();
        self.rows.iter().position(|r| *r == letter)
    }

    /// Абсолютный 1-based индекс места: rowIndex * seatsPerRow + column.
    fn absolute_index(&self, row_index: usize, column: u32) -> u64 {
        row_index as u64 * self.seats_per_row as u64 + column as u64
    }

    /// Раскладка зала, обрезанная по вместимости: ряды с кодами мест по порядку.
    /// Ряды, в которых не осталось ни одного места, не попадают в результат.
    pub fn layout(&self, capacity: i32) -> Vec<(char, Vec<String>)> {
        let capacity = capacity.max(0) as u64;
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let seats = (1..=self.seats_per_row)
                    .take_while(|col| self.absolute_index(idx, *col) <= capacity)
                    .map(|col| format!("{row}{col}"))
                    .collect::<Vec<_>>();
                (*row, seats)
            })
            .filter(|(_, seats)| !seats.is_empty())
            .collect()
    }
}

fn invalid(code: &str, reason: &str) -> BookingError {
    BookingError::Validation(format!("Invalid seat code: {code}. {reason}"))
}

/// Проверяет код места и возвращает его каноническую форму (`a07` -> `A7`).
///
/// Каноническая форма важна: уникальность активных мест в БД проверяется
/// по строке, и `A7`/`a07` не должны считаться разными местами.
pub fn validate_seat_code(code: &str, capacity: i32, grid: &SeatGrid) -> BookingResult<String> {
    let mut chars = code.chars();
    let letter = match chars.next() {
        Some(c) if code.chars().count() >= 2 => c,
        _ => return Err(invalid(code, "Seat code is too short.")),
    };
    let column_part = chars.as_str();

    if !column_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(code, "Seat number must be numeric."));
    }
    let column: u32 = column_part
        .parse()
        .map_err(|_| invalid(code, "Seat number must be numeric."))?;
    if column == 0 || column > grid.seats_per_row {
        return Err(invalid(code, "Seat number is outside the row."));
    }

    let row_index = grid
        .row_index(letter)
        .ok_or_else(|| invalid(code, "Unknown row."))?;

    if grid.absolute_index(row_index, column) > capacity.max(0) as u64 {
        return Err(invalid(code, "This seat is not part of the screen layout."));
    }

    Ok(format!("{}{}", letter.to_ascii_uppercase(), column))
}
