mod smithing;
