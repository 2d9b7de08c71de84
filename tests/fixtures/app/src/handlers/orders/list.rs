/// @ID list-orders
/// @StatusCode 206
/// @StatusCode many
pub fn list_orders(page: Page) -> Response<Vec<Order>> {
    Response { status: 200, body: page.fetch() }
}
