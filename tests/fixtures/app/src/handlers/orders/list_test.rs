/// @ID from-test-unit
pub fn cancel_order() {}
