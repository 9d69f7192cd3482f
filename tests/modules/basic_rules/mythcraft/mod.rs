mod background;
mod feature;
mod lineage;
mod profession;
mod talent;
