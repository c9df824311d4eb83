// Serial link to the radio bridge
//
// Provides:
// - Opening the device with the default framing (8N1)
// - Fire-and-forget frame writes (nothing is ever read back)

mod link;

pub use link::SerialLink;
