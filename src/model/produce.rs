/// A matched producer/consumer pair.
pub struct Produce<P, C> {
	pub producer: P,
	pub consumer: C,
}
