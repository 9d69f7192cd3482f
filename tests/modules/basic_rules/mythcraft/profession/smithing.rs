// basic-rules/mythcraft: basic-rules/mythcraft/profession/smithing
use mythcraft::system::mythcraft::{data::Item, SystemConfig};

#[test]
fn parse_and_validate() -> anyhow::Result<()> {
	let item: Item = serde_json::from_str(include_str!("/root/crate/modules/basic-rules/mythcraft/profession/smithing.json"))?;
	assert!(!item.id.is_empty(), "basic-rules/mythcraft/profession/smithing has no id");
	let config = SystemConfig::default();
	for advancement in item.advancements() {
		advancement.validate(&config)?;
	}
	Ok(())
}
