use std::{
	collections::{BTreeMap, VecDeque},
	io::Write,
	path::{Path, PathBuf},
};

/// Generates one test per content file under `modules/<module>/<system>/`,
/// mirroring the directory layout as nested test modules under `tests/modules/`.
fn main() -> std::io::Result<()> {
	println!("cargo:rerun-if-changed=build.rs");
	println!("cargo:rerun-if-changed=tests/modules_template");
	println!("cargo:rerun-if-changed=modules");

	let modules_root = Path::new("./modules");
	let tests_root = Path::new("./tests/modules");

	let mut root = Module::default();
	for (module_path, module_id) in subdirectories(modules_root) {
		for (system_path, system_id) in subdirectories(&module_path) {
			for path in WalkDir::new(&system_path) {
				if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
					continue;
				}
				let Ok(relative) = path.strip_prefix(modules_root) else {
					continue;
				};
				let relative = relative.with_extension("");
				let absolute = path.canonicalize()?;
				let absolute = absolute.display().to_string().replace('\\', "/").replace("//?/", "");
				println!("cargo:rerun-if-changed={absolute}");

				let entry = ContentEntry {
					abs_path: PathBuf::from(absolute),
					rel_path: relative.clone(),
					module_id: module_id.clone(),
					system_id: system_id.clone(),
				};
				root.insert(&relative, entry);
			}
		}
	}

	if tests_root.exists() {
		std::fs::remove_dir_all(tests_root)?;
	}
	root.generate(tests_root)
}

fn subdirectories(path: &Path) -> Vec<(PathBuf, String)> {
	let Ok(entries) = std::fs::read_dir(path) else {
		return Vec::new();
	};
	let mut dirs = entries
		.filter_map(Result::ok)
		.filter(|entry| entry.metadata().map(|meta| meta.is_dir()).unwrap_or(false))
		.filter_map(|entry| Some((entry.path(), entry.file_name().to_str()?.to_owned())))
		.collect::<Vec<_>>();
	dirs.sort();
	dirs
}

/// Depth-first iterator over every file beneath a directory.
struct WalkDir {
	stack: Vec<std::fs::ReadDir>,
}

impl WalkDir {
	fn new(path: impl AsRef<Path>) -> Self {
		Self { stack: std::fs::read_dir(path).into_iter().collect() }
	}
}

impl Iterator for WalkDir {
	type Item = PathBuf;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let iter = self.stack.last_mut()?;
			let Some(entry) = iter.next() else {
				self.stack.pop();
				continue;
			};
			let Ok(entry) = entry else { continue };
			let Ok(metadata) = entry.metadata() else { continue };
			if metadata.is_dir() {
				if let Ok(children) = std::fs::read_dir(entry.path()) {
					self.stack.push(children);
				}
				continue;
			}
			if metadata.is_file() {
				return Some(entry.path());
			}
		}
	}
}

#[derive(Debug)]
struct ContentEntry {
	abs_path: PathBuf,
	rel_path: PathBuf,
	module_id: String,
	system_id: String,
}

#[derive(Default, Debug)]
struct Module {
	submodules: BTreeMap<String, Module>,
	entries: BTreeMap<String, ContentEntry>,
}

impl Module {
	fn symbol(name: &str) -> String {
		use convert_case::{Case, Casing};
		let name = name.replace(&['-', '.', ' '][..], "_").to_case(Case::Snake);
		match name.starts_with(char::is_numeric) {
			true => format!("n_{name}"),
			false => name,
		}
	}

	fn insert(&mut self, path: &Path, entry: ContentEntry) {
		let parts = path.components().filter_map(|comp| comp.as_os_str().to_str()).collect::<VecDeque<_>>();
		self.insert_parts(parts, entry);
	}

	fn insert_parts(&mut self, mut parts: VecDeque<&str>, entry: ContentEntry) {
		let Some(name) = parts.pop_front() else { return };
		if parts.is_empty() {
			self.entries.insert(Self::symbol(name), entry);
			return;
		}
		let submodule = self.submodules.entry(Self::symbol(name)).or_default();
		submodule.insert_parts(parts, entry);
	}

	fn generate(&self, dir: &Path) -> std::io::Result<()> {
		std::fs::create_dir_all(dir)?;
		let mut lines = Vec::with_capacity(self.submodules.len() + self.entries.len());
		for (name, submodule) in &self.submodules {
			submodule.generate(&dir.join(name))?;
			lines.push(format!("mod {name};"));
		}
		for (name, entry) in &self.entries {
			let mut file = std::fs::File::create(dir.join(name).with_extension("rs"))?;
			write!(file, "{}", Self::test_content(entry))?;
			lines.push(format!("mod {name};"));
		}
		let mut file = std::fs::File::create(dir.join("mod.rs"))?;
		writeln!(file, "{}", lines.join("\n"))
	}

	fn test_content(entry: &ContentEntry) -> String {
		include_str!("./tests/modules_template")
			.replace("{abs_path_to_json}", &entry.abs_path.display().to_string())
			.replace("{rel_path_to_json}", &entry.rel_path.display().to_string().replace('\\', "/"))
			.replace("{module_id}", &entry.module_id)
			.replace("{system_id}", &entry.system_id)
	}
}
