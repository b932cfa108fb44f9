/// Named blocking-wait primitives.
///
/// Boot code runs before any timer or interrupt exists, so every wait is
/// a poll with no timeout. Callers go through these functions so a
/// watchdog bound can be added in one place.

/// Spin until `ready` returns true.
#[inline]
pub fn poll_until(mut ready: impl FnMut() -> bool) {
    while !ready() {
        core::hint::spin_loop();
    }
}

/// Burn roughly `iterations` loop turns. Used for cosmetic pacing only.
#[inline(never)]
pub fn busy_delay(iterations: u32) {
    for i in 0..iterations {
        core::hint::black_box(i);
        core::hint::spin_loop();
    }
}
