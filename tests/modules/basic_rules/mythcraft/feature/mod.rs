mod second_wind;
