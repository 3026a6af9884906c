//! Plain-text rendering of slots and bookings for stdout.

use chrono::{DateTime, Utc};
use vetbook_common::{Booking, LoginResponse, Person, Slot};
use vetbook_reconciler::BookingView;

const TIME_FORMAT: &str = "%a %d %b %Y %H:%M UTC";

fn when(at: &DateTime<Utc>) -> String {
    at.format(TIME_FORMAT).to_string()
}

fn span(slot: &Slot) -> String {
    format!(
        "{}-{} UTC",
        slot.start_at.format("%a %d %b %Y %H:%M"),
        slot.end_at().format("%H:%M")
    )
}

fn person(person: Option<&Person>) -> String {
    person.map(Person::display_name).unwrap_or_else(|| "-".to_string())
}

pub fn format_slot(slot: &Slot) -> String {
    let mut line = format!(
        "#{:<6} {}  {}",
        slot.id,
        span(slot),
        person(slot.doctor.as_ref())
    );
    if slot.booked {
        line.push_str("  [booked]");
    }
    line
}

pub fn format_booking(view: &BookingView) -> String {
    let booking = &view.booking;
    let mut line = format!(
        "#{:<6} {}  {:<9}  {}",
        booking.id,
        when(&booking.start_at),
        view.status,
        person(booking.doctor.as_ref())
    );
    if let Some(message) = booking.message.as_deref().filter(|m| !m.is_empty()) {
        line.push_str(&format!("  \"{}\"", message));
    }
    if view.cancellable {
        line.push_str("  (cancellable)");
    }
    line
}

pub fn print_slots(slots: &[Slot]) {
    if slots.is_empty() {
        println!("No slots available.");
        return;
    }
    for slot in slots {
        println!("{}", format_slot(slot));
    }
}

pub fn print_bookings(views: &[BookingView]) {
    if views.is_empty() {
        println!("No appointments yet.");
        return;
    }
    for view in views {
        println!("{}", format_booking(view));
    }
}

/// Doctor view of appointments, with the patient's contact details.
pub fn print_appointments(bookings: &[Booking]) {
    if bookings.is_empty() {
        println!("No appointments booked.");
        return;
    }
    for booking in bookings {
        println!(
            "#{:<6} {}  {}  {}  {}",
            booking.id,
            when(&booking.start_at),
            person(booking.user.as_ref()),
            booking.phone.as_deref().unwrap_or("-"),
            booking.message.as_deref().unwrap_or("")
        );
    }
}

pub fn print_booked(booking: &Booking) {
    println!(
        "Booked appointment #{} on {}",
        booking.id,
        when(&booking.start_at)
    );
}

pub fn print_login(login: &LoginResponse) {
    println!("token: {}", login.token);
    if let Some(role) = &login.role {
        println!("role:  {}", role);
    }
}
