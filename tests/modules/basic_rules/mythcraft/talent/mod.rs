mod brawler;
