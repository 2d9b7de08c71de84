// @generated by protoc-gen-handlers. DO NOT EDIT.

/// @ID generated-cancel-order
pub fn cancel_order() {}
