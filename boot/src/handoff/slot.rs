/// Static storage for a value that has to outlive a stack switch.
///
/// `switch_stack` abandons the old stack, so the controller is parked
/// here first and taken back on the new stack. The lock is held only
/// inside `park` and `take`.
use spin::Mutex;

pub struct ParkingSlot<T> {
    value: Mutex<Option<T>>,
}

impl<T> ParkingSlot<T> {
    pub const fn new() -> Self {
        Self { value: Mutex::new(None) }
    }

    /// Store `value`, replacing anything already parked.
    pub fn park(&self, value: T) {
        *self.value.lock() = Some(value);
    }

    /// Remove the parked value. The slot is unlocked again on return.
    pub fn take(&self) -> Option<T> {
        self.value.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.value.lock().is_none()
    }
}

impl<T> Default for ParkingSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
