mod human;
