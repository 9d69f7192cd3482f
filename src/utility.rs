use std::ops::AddAssign;

mod error;
pub use error::*;

pub type PinFutureLifetime<'l, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + 'l + Send>>;

/// Joins a list of names into an english phrase (`a`, `a and b`, `a, b, and c`).
pub fn list_as_english(mut items: Vec<String>, joiner: &str) -> Option<String> {
	match items.len() {
		0 => None,
		1 => items.pop(),
		2 => Some(items.join(format!(" {joiner} ").as_str())),
		_ => {
			if let Some(last) = items.last_mut() {
				*last = format!("{joiner} {last}");
			}
			Some(items.join(", "))
		}
	}
}

pub trait AddAssignMap {
	fn add_assign_map(&mut self, other: &Self);
}
impl AddAssignMap for u32 {
	fn add_assign_map(&mut self, other: &Self) {
		self.add_assign(other);
	}
}
impl<K, V> AddAssignMap for std::collections::BTreeMap<K, V>
where
	K: Clone + std::cmp::Ord,
	V: Clone + AddAssignMap,
{
	fn add_assign_map(&mut self, other: &Self) {
		for (key, value) in other {
			match self.get_mut(key) {
				None => {
					self.insert(key.clone(), value.clone());
				}
				Some(dst_value) => {
					dst_value.add_assign_map(value);
				}
			}
		}
	}
}
